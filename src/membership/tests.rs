//! Membership Module Tests
//!
//! ## Test Scopes
//! - **Data Structures**: node ids, ordering and serialization.
//! - **Ring Validation**: ids must form `1..=N`, the local node must be a member.
//! - **Peer Iteration**: peers exclude the local node and come in ascending order.

#[cfg(test)]
mod tests {
    use crate::error::StorageError;
    use crate::membership::service::RingMembership;
    use crate::membership::types::{Node, NodeId};

    fn ring_nodes(n: u32) -> Vec<Node> {
        (1..=n)
            .map(|id| Node::new(id, format!("127.0.0.1:{}", 5000 + id).parse().unwrap()))
            .collect()
    }

    // ============================================================
    // NODE TESTS
    // ============================================================

    #[test]
    fn test_node_id_index_is_zero_based() {
        assert_eq!(NodeId(1).index(), 0);
        assert_eq!(NodeId(5).index(), 4);
    }

    #[test]
    fn test_node_id_ordering() {
        let mut ids = vec![NodeId(3), NodeId(1), NodeId(2)];
        ids.sort();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_node_base_url() {
        let node = Node::new(2, "127.0.0.1:5002".parse().unwrap());
        assert_eq!(node.base_url(), "http://127.0.0.1:5002");
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::new(4, "10.0.0.4:5004".parse().unwrap());

        let json = serde_json::to_string(&node).expect("Serialization failed");
        let restored: Node = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored, node);
    }

    // ============================================================
    // RING VALIDATION TESTS
    // ============================================================

    #[test]
    fn test_ring_accepts_unsorted_members() {
        let mut nodes = ring_nodes(5);
        nodes.reverse();

        let ring = RingMembership::new(NodeId(3), nodes).expect("valid ring");

        assert_eq!(ring.size(), 5);
        let ids: Vec<u32> = ring.members().iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(ring.local_node.id, NodeId(3));
    }

    #[test]
    fn test_ring_rejects_gaps() {
        let nodes: Vec<Node> = ring_nodes(5).into_iter().filter(|n| n.id.0 != 3).collect();

        let result = RingMembership::new(NodeId(1), nodes);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_ring_rejects_duplicates() {
        let mut nodes = ring_nodes(3);
        nodes.push(Node::new(2, "127.0.0.1:6002".parse().unwrap()));

        let result = RingMembership::new(NodeId(1), nodes);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_ring_rejects_unknown_local_node() {
        let result = RingMembership::new(NodeId(9), ring_nodes(5));
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_ring_rejects_empty() {
        let result = RingMembership::new(NodeId(1), vec![]);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    // ============================================================
    // PEER TESTS
    // ============================================================

    #[test]
    fn test_peers_exclude_local_in_ascending_order() {
        let ring = RingMembership::new(NodeId(3), ring_nodes(5)).unwrap();

        let peers: Vec<u32> = ring.peers().map(|n| n.id.0).collect();
        assert_eq!(peers, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_single_node_ring_has_no_peers() {
        let ring = RingMembership::new(NodeId(1), ring_nodes(1)).unwrap();
        assert_eq!(ring.peers().count(), 0);
    }

    #[test]
    fn test_get_member() {
        let ring = RingMembership::new(NodeId(1), ring_nodes(5)).unwrap();

        let member = ring.get_member(NodeId(4));
        assert_eq!(member.unwrap().http_addr.port(), 5004);
        assert!(ring.get_member(NodeId(6)).is_none());
        assert!(ring.is_local(NodeId(1)));
        assert!(!ring.is_local(NodeId(2)));
    }
}
