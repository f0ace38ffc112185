//! Storage Network Protocol
//!
//! Defines the HTTP routes and the JSON documents exchanged between clients
//! and nodes and between peers.
//!
//! Field names are part of the wire format and are kept exactly as existing
//! clients and nodes expect them (`fileId`, `originalName`, ...). Fragment
//! indices travel as strings inside fragment push documents for the same
//! reason; they are plain `u32` once decoded.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Liveness check.
pub const ENDPOINT_STATUS: &str = "/status";
/// Lists every manifest known to the node.
pub const ENDPOINT_FILES: &str = "/files";
/// Client upload entry point (`?name=`).
pub const ENDPOINT_UPLOAD: &str = "/upload";
/// Client download entry point (`?fileId=`).
pub const ENDPOINT_DOWNLOAD: &str = "/download";
/// Peer fragment push target.
pub const ENDPOINT_STORE_FRAGMENTS: &str = "/internal/storeFragments";
/// Peer manifest push target.
pub const ENDPOINT_ANNOUNCE_FILE: &str = "/internal/announceFile";
/// Peer fragment pull target (`?fileId=&index=`).
pub const ENDPOINT_GET_FRAGMENT: &str = "/internal/getFragment";

// --- Data Transfer Objects ---

/// Per-file metadata record, replicated to every node.
///
/// Its presence on a node is the node's only record that the file exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub file_id: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub total_fragments: u32,
}

/// One entry of the `/files` listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub name: String,
}

/// Body of `/internal/storeFragments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFragmentsRequest {
    pub file_id: String,
    pub fragments: Vec<FragmentPayload>,
}

/// A single fragment in a push, bytes base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentPayload {
    #[serde(with = "index_as_string")]
    pub index: u32,
    pub data: String,
}

/// Acknowledgement of a push: the hash each fragment had on arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFragmentsResponse {
    pub file_id: String,
    pub received: Vec<FragmentReceipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FragmentReceipt {
    #[serde(with = "index_as_string")]
    pub index: u32,
    pub hash: String,
}

impl StoreFragmentsResponse {
    pub fn hash_of(&self, index: u32) -> Option<&str> {
        self.received
            .iter()
            .find(|receipt| receipt.index == index)
            .map(|receipt| receipt.hash.as_str())
    }
}

/// Returned to the client after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceResponse {
    pub status: String,
}

// --- Query parameters ---

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetFragmentParams {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
    pub index: Option<String>,
}

/// Fragment indices are written as JSON strings; integers are accepted on
/// input too.
pub(crate) mod index_as_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(index: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&index.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawIndex {
        Text(String),
        Number(u32),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match RawIndex::deserialize(deserializer)? {
            RawIndex::Number(index) => Ok(index),
            RawIndex::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid fragment index {:?}", text))),
        }
    }
}
