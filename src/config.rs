//! Node configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file at all) describes the classic five-node ring on `127.0.0.1:5001..5005`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StorageError};
use crate::membership::types::{Node, NodeId};

/// Number of nodes in the default ring.
pub const DEFAULT_RING_SIZE: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEndpoint {
    pub id: u32,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Parent of the per-node directories (`<data_dir>/node-<id>`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The full ring, one entry per node.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeEndpoint>,

    /// Requests served at the same time; further requests wait for a slot.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Largest accepted request body (uploads and fragment pushes).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Attempts per peer when pushing fragments.
    #[serde(default = "default_attempts")]
    pub replication_attempts: usize,

    /// Attempts per peer when announcing a manifest.
    #[serde(default = "default_attempts")]
    pub announce_attempts: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_nodes() -> Vec<NodeEndpoint> {
    (1..=DEFAULT_RING_SIZE)
        .map(|id| NodeEndpoint {
            id,
            addr: SocketAddr::from(([127, 0, 0, 1], 5000 + id as u16)),
        })
        .collect()
}

fn default_max_concurrent_requests() -> usize {
    256
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_attempts() -> usize {
    3
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            nodes: default_nodes(),
            max_concurrent_requests: default_max_concurrent_requests(),
            max_body_bytes: default_max_body_bytes(),
            connect_timeout_ms: default_timeout_ms(),
            request_timeout_ms: default_timeout_ms(),
            replication_attempts: default_attempts(),
            announce_attempts: default_attempts(),
        }
    }
}

impl NodeConfig {
    /// Reads a TOML config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: NodeConfig =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Ring with the given id set, all on localhost, listening on `addrs`.
    pub fn for_ring(data_dir: PathBuf, addrs: &[SocketAddr]) -> Self {
        Self {
            data_dir,
            nodes: addrs
                .iter()
                .enumerate()
                .map(|(i, addr)| NodeEndpoint {
                    id: i as u32 + 1,
                    addr: *addr,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_requests == 0 {
            return Err(StorageError::Config(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.replication_attempts == 0 || self.announce_attempts == 0 {
            return Err(StorageError::Config(
                "attempt budgets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ring(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|endpoint| Node::new(endpoint.id, endpoint.addr))
            .collect()
    }

    pub fn endpoint(&self, id: NodeId) -> Option<&NodeEndpoint> {
        self.nodes.iter().find(|endpoint| endpoint.id == id.0)
    }

    /// Overrides the port the given node listens on.
    pub fn set_port(&mut self, id: NodeId, port: u16) {
        if let Some(endpoint) = self.nodes.iter_mut().find(|e| e.id == id.0) {
            endpoint.addr.set_port(port);
        }
    }

    pub fn node_root(&self, id: NodeId) -> PathBuf {
        self.data_dir.join(format!("node-{}", id))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ring_matches_classic_layout() {
        let config = NodeConfig::default();

        assert_eq!(config.nodes.len(), 5);
        assert_eq!(config.nodes[0].addr.port(), 5001);
        assert_eq!(config.nodes[4].addr.port(), 5005);
        assert_eq!(config.node_root(NodeId(3)), PathBuf::from("data/node-3"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: NodeConfig = toml::from_str("").unwrap();

        assert_eq!(config.replication_attempts, 3);
        assert_eq!(config.announce_attempts, 3);
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.nodes.len(), 5);
    }

    #[test]
    fn test_toml_ring() {
        let text = r#"
            data_dir = "/var/lib/ring"
            max_concurrent_requests = 8

            [[nodes]]
            id = 1
            addr = "10.0.0.1:7000"

            [[nodes]]
            id = 2
            addr = "10.0.0.2:7000"
        "#;

        let config: NodeConfig = toml::from_str(text).unwrap();

        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.max_concurrent_requests, 8);
        assert_eq!(config.ring()[1].http_addr, "10.0.0.2:7000".parse().unwrap());
        assert_eq!(config.node_root(NodeId(2)), PathBuf::from("/var/lib/ring/node-2"));
    }

    #[test]
    fn test_set_port_overrides_local_endpoint() {
        let mut config = NodeConfig::default();
        config.set_port(NodeId(2), 9002);

        assert_eq!(config.endpoint(NodeId(2)).unwrap().addr.port(), 9002);
        assert_eq!(config.endpoint(NodeId(1)).unwrap().addr.port(), 5001);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = NodeConfig {
            replication_attempts: 0,
            ..NodeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
