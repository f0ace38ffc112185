use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// 1-based position of a node in the ring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Zero-based ring index (`id - 1`).
    pub fn index(&self) -> u32 {
        self.0.saturating_sub(1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a single member of the ring.
///
/// The ring is static: identity and address come from configuration and never
/// change while the process runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub http_addr: SocketAddr,
}

impl Node {
    pub fn new(id: u32, http_addr: SocketAddr) -> Self {
        Self {
            id: NodeId(id),
            http_addr,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.http_addr)
    }
}
