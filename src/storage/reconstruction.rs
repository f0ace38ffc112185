//! Download path: gather every fragment, concatenate, verify.

use tracing::{debug, info, warn};

use super::hash::{content_hash, default_file_name};
use super::node::StorageNode;
use crate::error::{Result, StorageError};

/// A reassembled, verified file.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub file_id: String,
    pub name: String,
    pub data: Vec<u8>,
}

impl StorageNode {
    /// Rebuilds `file_id` from the ring.
    ///
    /// Only files with a local manifest can be downloaded. Each fragment is
    /// read from disk if this node owns it, otherwise from its owners, primary
    /// first, one attempt each.
    pub async fn download(&self, file_id: &str) -> Result<DownloadedFile> {
        let manifest = self
            .store
            .get_manifest(file_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;

        let mut data = Vec::new();
        for index in 0..self.placement.ring_size() {
            let fragment = self.fetch_fragment(file_id, index).await?;
            data.extend_from_slice(&fragment);
        }

        verify_content(file_id, &data)?;

        let name = if manifest.original_name.is_empty() {
            default_file_name(file_id)
        } else {
            manifest.original_name
        };

        info!(file_id = %file_id, size = data.len(), "Download reconstructed");
        Ok(DownloadedFile {
            file_id: file_id.to_string(),
            name,
            data,
        })
    }

    async fn fetch_fragment(&self, file_id: &str, index: u32) -> Result<Vec<u8>> {
        match self.store.get(file_id, index).await {
            Ok(Some(bytes)) => return Ok(bytes),
            Ok(None) => {}
            Err(e) => warn!(file_id = %file_id, index, "Local fragment unreadable: {}", e),
        }

        for owner in self.placement.owners_of(index) {
            if self.membership.is_local(owner) {
                continue;
            }
            let Some(node) = self.membership.get_member(owner) else {
                continue;
            };

            match self.peers.get_fragment(node, file_id, index).await {
                Ok(Some(bytes)) => {
                    debug!(file_id = %file_id, index, node = %owner, "Fetched fragment from peer");
                    return Ok(bytes);
                }
                Ok(None) => debug!(file_id = %file_id, index, node = %owner, "Peer lacks fragment"),
                Err(e) => warn!(file_id = %file_id, index, node = %owner, "Fragment fetch failed: {}", e),
            }
        }

        Err(StorageError::FragmentUnavailable { index })
    }
}

/// The SHA-256 of the reassembled bytes must be the file id.
pub fn verify_content(file_id: &str, data: &[u8]) -> Result<()> {
    let actual = content_hash(data);
    if actual == file_id {
        Ok(())
    } else {
        Err(StorageError::Corrupted {
            expected: file_id.to_string(),
            actual,
        })
    }
}
