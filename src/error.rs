//! Error types for the storage node.
//!
//! Every failure a request can hit is a `StorageError`. Handlers return it
//! directly; the `IntoResponse` impl maps each variant to the status code the
//! client expects (4xx for protocol problems, 404 for missing data, 500 for
//! replication, retrieval and integrity failures).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::membership::types::NodeId;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Fragment not found: {file_id}/{index}")]
    FragmentNotFound { file_id: String, index: u32 },

    #[error("Missing {0}")]
    MissingParameter(&'static str),

    #[error("Content-Length required")]
    LengthRequired,

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid fileId: {0:?}")]
    InvalidFileId(String),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Replication failed: node {node} unreachable after {attempts} attempts")]
    ReplicationFailed { node: NodeId, attempts: usize },

    #[error("Could not retrieve fragment {index}")]
    FragmentUnavailable { index: u32 },

    #[error("File corrupted: expected {expected}, got {actual}")]
    Corrupted { expected: String, actual: String },

    #[error("Hash mismatch on fragment {index}: expected {expected}, got {actual}")]
    HashMismatch {
        index: u32,
        expected: String,
        actual: String,
    },

    #[error("Node {node} answered with status {status}")]
    UnexpectedStatus { node: NodeId, status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::NotFound(_) | StorageError::FragmentNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            StorageError::MissingParameter(_)
            | StorageError::InvalidManifest(_)
            | StorageError::InvalidPayload(_)
            | StorageError::InvalidFileId(_)
            | StorageError::InvalidIndex(_) => StatusCode::BAD_REQUEST,
            StorageError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, format!("{}\n", self)).into_response()
    }
}
