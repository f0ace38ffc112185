//! Upload coordination.
//!
//! The node that receives an upload splits it, keeps the fragments it owns,
//! pushes every peer the fragments that peer owns and only then records the
//! manifest. Peers are contacted one at a time in ascending id order.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use super::hash::{content_hash, default_file_name};
use super::node::StorageNode;
use super::partitioner::{Fragment, split_fragments};
use super::peer::with_retry;
use super::protocol::{FragmentPayload, Manifest, StoreFragmentsRequest, StoreFragmentsResponse};
use crate::error::{Result, StorageError};
use crate::membership::types::Node;

impl StorageNode {
    /// Stores `data` across the ring and returns its manifest.
    ///
    /// Fails with `ReplicationFailed` as soon as one peer cannot be given its
    /// fragments. Fragments already written stay where they are; without a
    /// manifest they are invisible.
    pub async fn upload(&self, data: &[u8], name: Option<&str>) -> Result<Manifest> {
        let file_id = content_hash(data);
        let original_name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_file_name(&file_id),
        };
        let ring_size = self.placement.ring_size();

        info!(
            file_id = %file_id,
            name = %original_name,
            size = data.len(),
            "Upload received"
        );

        let fragments = split_fragments(data, ring_size as usize);

        for index in self.placement.owned_indices(self.id()) {
            let fragment = &fragments[index as usize];
            self.store.put(&file_id, index, &fragment.data).await?;
        }

        for peer in self.membership.peers() {
            self.replicate_to(peer, &file_id, &fragments).await?;
        }

        let manifest = Manifest {
            file_id,
            original_name,
            total_fragments: ring_size,
        };
        self.store.put_manifest(&manifest).await?;

        self.announce(&manifest).await;

        info!(file_id = %manifest.file_id, "Upload complete");
        Ok(manifest)
    }

    /// Pushes `peer` the fragments it owns, retrying on transport errors, bad
    /// statuses and hash mismatches.
    async fn replicate_to(&self, peer: &Node, file_id: &str, fragments: &[Fragment]) -> Result<()> {
        let owned: Vec<&Fragment> = self
            .placement
            .owned_indices(peer.id)
            .into_iter()
            .map(|index| &fragments[index as usize])
            .collect();

        let request = StoreFragmentsRequest {
            file_id: file_id.to_string(),
            fragments: owned
                .iter()
                .map(|fragment| FragmentPayload {
                    index: fragment.index,
                    data: STANDARD.encode(&fragment.data),
                })
                .collect(),
        };

        let label = format!("storeFragments to node {}", peer.id);
        let attempts = self.replication_attempts;
        let (request, owned) = (&request, &owned);

        with_retry(attempts, &label, |_| async move {
            let response = self.peers.store_fragments(peer, request).await?;
            verify_receipts(owned, &response)
        })
        .await
        .map_err(|e| {
            warn!(node = %peer.id, file_id = %file_id, "Giving up on replication: {}", e);
            StorageError::ReplicationFailed {
                node: peer.id,
                attempts,
            }
        })?;

        debug!(node = %peer.id, file_id = %file_id, "Replicated fragments");
        Ok(())
    }

    /// Sends the manifest to every peer. Failures are logged and otherwise
    /// ignored; a peer that misses the announcement simply does not list the
    /// file.
    pub async fn announce(&self, manifest: &Manifest) {
        for peer in self.membership.peers() {
            let label = format!("announceFile to node {}", peer.id);
            let result = with_retry(self.announce_attempts, &label, |_| {
                self.peers.announce_file(peer, manifest)
            })
            .await;

            if let Err(e) = result {
                warn!(
                    node = %peer.id,
                    file_id = %manifest.file_id,
                    "Announcement dropped: {}", e
                );
            }
        }
    }
}

/// Every pushed fragment must come back with the hash computed before sending.
fn verify_receipts(sent: &[&Fragment], response: &StoreFragmentsResponse) -> Result<()> {
    for fragment in sent {
        let actual = response.hash_of(fragment.index).unwrap_or_default();
        if actual != fragment.hash {
            return Err(StorageError::HashMismatch {
                index: fragment.index,
                expected: fragment.hash.clone(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::protocol::FragmentReceipt;

    fn fragments() -> Vec<Fragment> {
        split_fragments(b"0123456789", 5)
    }

    #[test]
    fn test_verify_receipts_accepts_matching_hashes() {
        let fragments = fragments();
        let sent = vec![&fragments[1], &fragments[2]];
        let response = StoreFragmentsResponse {
            file_id: "x".to_string(),
            received: sent
                .iter()
                .map(|f| FragmentReceipt {
                    index: f.index,
                    hash: f.hash.clone(),
                })
                .collect(),
        };

        assert!(verify_receipts(&sent, &response).is_ok());
    }

    #[test]
    fn test_verify_receipts_rejects_wrong_or_missing_hash() {
        let fragments = fragments();
        let sent = vec![&fragments[1], &fragments[2]];

        let wrong = StoreFragmentsResponse {
            file_id: "x".to_string(),
            received: vec![
                FragmentReceipt {
                    index: 1,
                    hash: fragments[1].hash.clone(),
                },
                FragmentReceipt {
                    index: 2,
                    hash: "00".to_string(),
                },
            ],
        };
        let err = verify_receipts(&sent, &wrong).unwrap_err();
        assert!(matches!(err, StorageError::HashMismatch { index: 2, .. }));

        let missing = StoreFragmentsResponse {
            file_id: "x".to_string(),
            received: vec![FragmentReceipt {
                index: 1,
                hash: fragments[1].hash.clone(),
            }],
        };
        let err = verify_receipts(&sent, &missing).unwrap_err();
        assert!(matches!(err, StorageError::HashMismatch { index: 2, .. }));
    }
}
