//! Replicated Ring File Store
//!
//! A fixed ring of N storage nodes that together hold every uploaded file.
//! Each file is split into N fragments; every fragment lives on two adjacent
//! nodes, so any single node can be lost without losing data.
//!
//! ## Modules
//! - **`membership`**: the static, ordered set of nodes in the ring.
//! - **`storage`**: fragmenting, placement, on-disk storage, the peer
//!   replication protocol and download reconstruction.
//! - **`server`**: the axum router exposing client and peer routes.
//! - **`config`**: TOML configuration with defaults for a local five-node ring.
//! - **`error`**: the error type shared by every layer and its HTTP mapping.

pub mod config;
pub mod error;
pub mod membership;
pub mod server;
pub mod storage;
