use super::hash::content_hash;
use crate::membership::types::NodeId;

/// One contiguous slice of a file together with its own checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub index: u32,
    pub data: Vec<u8>,
    pub hash: String,
}

/// Sizes of the `parts` fragments of a `total`-byte file: `total / parts`
/// each, the first `total % parts` one byte larger.
pub fn fragment_sizes(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let remainder = total % parts;
    (0..parts)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// Splits `data` into `parts` contiguous fragments, hashing each one.
pub fn split_fragments(data: &[u8], parts: usize) -> Vec<Fragment> {
    let mut offset = 0;
    fragment_sizes(data.len(), parts)
        .into_iter()
        .enumerate()
        .map(|(index, size)| {
            let slice = &data[offset..offset + size];
            offset += size;
            Fragment {
                index: index as u32,
                data: slice.to_vec(),
                hash: content_hash(slice),
            }
        })
        .collect()
}

/// Ring placement: fragment `i` lives on node `i + 1` and on its ring
/// predecessor. Independent of file identity.
#[derive(Debug, Clone, Copy)]
pub struct RingPlacement {
    ring_size: u32,
}

impl RingPlacement {
    pub fn new(ring_size: u32) -> Self {
        assert!(ring_size > 0, "ring must contain at least one node");
        Self { ring_size }
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    /// Primary first, then the ring-adjacent secondary. A single-node ring
    /// yields one owner.
    pub fn owners_of(&self, index: u32) -> Vec<NodeId> {
        let n = self.ring_size;
        let primary = NodeId(index % n + 1);
        let secondary = NodeId((index % n + n - 1) % n + 1);
        if primary == secondary {
            vec![primary]
        } else {
            vec![primary, secondary]
        }
    }

    /// The fragment indices `node` is responsible for, for every file.
    pub fn owned_indices(&self, node: NodeId) -> Vec<u32> {
        let first = node.index();
        let second = node.0 % self.ring_size;
        if first == second {
            vec![first]
        } else {
            vec![first, second]
        }
    }

    pub fn is_owner(&self, node: NodeId, index: u32) -> bool {
        self.owned_indices(node).contains(&index)
    }
}
