//! Per-node on-disk storage of fragments and manifests.
//!
//! Layout under the node root:
//!
//! ```text
//! <root>/<fileId>/manifest.json
//! <root>/<fileId>/fragments/<index>.frag
//! ```
//!
//! Nothing is ever deleted. Every write goes to a temporary file in the
//! destination directory and is renamed into place, so readers see either the
//! old content or the new content, never a partial file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use super::protocol::Manifest;
use crate::error::{Result, StorageError};

const MANIFEST_FILE: &str = "manifest.json";
const FRAGMENTS_DIR: &str = "fragments";
const FRAGMENT_EXT: &str = "frag";

pub struct LocalFragmentStore {
    root: PathBuf,
}

impl LocalFragmentStore {
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        info!(path = %root.display(), "Opened fragment store");

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_dir(&self, file_id: &str) -> Result<PathBuf> {
        validate_file_id(file_id)?;
        Ok(self.root.join(file_id))
    }

    pub fn fragment_path(&self, file_id: &str, index: u32) -> Result<PathBuf> {
        Ok(self
            .file_dir(file_id)?
            .join(FRAGMENTS_DIR)
            .join(format!("{}.{}", index, FRAGMENT_EXT)))
    }

    pub fn manifest_path(&self, file_id: &str) -> Result<PathBuf> {
        Ok(self.file_dir(file_id)?.join(MANIFEST_FILE))
    }

    pub async fn put(&self, file_id: &str, index: u32, data: &[u8]) -> Result<()> {
        let path = self.fragment_path(file_id, index)?;
        write_atomic(&path, data).await?;
        debug!(file_id = %file_id, index, size = data.len(), "Stored fragment");
        Ok(())
    }

    pub async fn get(&self, file_id: &str, index: u32) -> Result<Option<Vec<u8>>> {
        let path = self.fragment_path(file_id, index)?;
        read_optional(&path).await
    }

    pub async fn put_manifest(&self, manifest: &Manifest) -> Result<()> {
        let path = self.manifest_path(&manifest.file_id)?;
        let json = serde_json::to_vec(manifest)?;
        write_atomic(&path, &json).await?;
        debug!(file_id = %manifest.file_id, "Stored manifest");
        Ok(())
    }

    pub async fn get_manifest(&self, file_id: &str) -> Result<Option<Manifest>> {
        let path = self.manifest_path(file_id)?;
        match read_optional(&path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every readable manifest under the root, sorted by file id.
    pub async fn list_manifests(&self) -> Result<Vec<(String, Manifest)>> {
        let mut manifests = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(file_id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_file_id(&file_id).is_err() {
                continue;
            }

            match read_optional(&entry.path().join(MANIFEST_FILE)).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<Manifest>(&bytes) {
                    Ok(manifest) => manifests.push((file_id, manifest)),
                    Err(e) => warn!(file_id = %file_id, "Skipping unreadable manifest: {}", e),
                },
                Ok(None) => {}
                Err(e) => warn!(file_id = %file_id, "Failed to read manifest: {}", e),
            }
        }

        manifests.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(manifests)
    }
}

/// File ids become directory names, so only plain alphanumerics are allowed.
pub fn validate_file_id(file_id: &str) -> Result<()> {
    let valid = !file_id.is_empty()
        && file_id.len() <= 128
        && file_id.bytes().all(|b| b.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidFileId(file_id.to_string()))
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StorageError::Config(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(parent).await?;

    let tmp = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
