use std::sync::Arc;

use super::types::{Node, NodeId};
use crate::error::{Result, StorageError};

/// The fixed set of nodes this process belongs to.
///
/// Members are kept sorted by id and must be exactly `1..=N`; placement math
/// relies on that.
pub struct RingMembership {
    pub local_node: Node,
    members: Vec<Node>,
}

impl RingMembership {
    pub fn new(local_id: NodeId, mut members: Vec<Node>) -> Result<Arc<Self>> {
        if members.is_empty() {
            return Err(StorageError::Config("ring has no nodes".to_string()));
        }

        members.sort_by_key(|node| node.id);

        for (position, node) in members.iter().enumerate() {
            let expected = position as u32 + 1;
            if node.id.0 != expected {
                return Err(StorageError::Config(format!(
                    "ring ids must be 1..={} without gaps or duplicates, found {} at position {}",
                    members.len(),
                    node.id,
                    expected
                )));
            }
        }

        let local_node = members
            .iter()
            .find(|node| node.id == local_id)
            .cloned()
            .ok_or_else(|| {
                StorageError::Config(format!("node {} is not part of the ring", local_id))
            })?;

        tracing::info!(
            "Ring of {} nodes, local node {} at {}",
            members.len(),
            local_node.id,
            local_node.http_addr
        );

        Ok(Arc::new(Self {
            local_node,
            members,
        }))
    }

    pub fn size(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn members(&self) -> &[Node] {
        &self.members
    }

    pub fn get_member(&self, id: NodeId) -> Option<&Node> {
        self.members.iter().find(|node| node.id == id)
    }

    pub fn is_local(&self, id: NodeId) -> bool {
        self.local_node.id == id
    }

    /// Every other node, in ascending id order.
    pub fn peers(&self) -> impl Iterator<Item = &Node> {
        self.members
            .iter()
            .filter(move |node| node.id != self.local_node.id)
    }
}
