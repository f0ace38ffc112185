//! Content addressing: SHA-256 over raw bytes, rendered as lowercase hex.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`. Used both as the file id and as the
/// per-fragment checksum.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Display name used when the uploader did not supply one.
pub fn default_file_name(file_id: &str) -> String {
    let prefix = file_id.get(..8).unwrap_or(file_id);
    format!("file-{}", prefix)
}
