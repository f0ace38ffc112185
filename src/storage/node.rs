use std::sync::Arc;

use tracing::info;

use super::local::LocalFragmentStore;
use super::partitioner::RingPlacement;
use super::peer::PeerClient;
use super::protocol::{FileEntry, Manifest};
use crate::config::NodeConfig;
use crate::error::{Result, StorageError};
use crate::membership::service::RingMembership;
use crate::membership::types::NodeId;

/// One member of the storage ring.
///
/// Owns the local fragment store and the client used to talk to peers. Upload
/// coordination lives in `replication`, download reassembly in
/// `reconstruction`; both are `impl` blocks on this type.
pub struct StorageNode {
    pub(super) membership: Arc<RingMembership>,
    pub(super) placement: RingPlacement,
    pub(super) store: LocalFragmentStore,
    pub(super) peers: PeerClient,
    pub(super) replication_attempts: usize,
    pub(super) announce_attempts: usize,
}

impl StorageNode {
    pub fn new(
        membership: Arc<RingMembership>,
        store: LocalFragmentStore,
        peers: PeerClient,
        replication_attempts: usize,
        announce_attempts: usize,
    ) -> Self {
        let placement = RingPlacement::new(membership.size());
        Self {
            membership,
            placement,
            store,
            peers,
            replication_attempts,
            announce_attempts,
        }
    }

    /// Builds the node `id` described by `config`, opening its data directory.
    pub async fn from_config(config: &NodeConfig, id: NodeId) -> Result<Arc<Self>> {
        config.validate()?;

        let membership = RingMembership::new(id, config.ring())?;
        let store = LocalFragmentStore::open(config.node_root(id)).await?;
        let peers = PeerClient::new(config.connect_timeout(), config.request_timeout())?;

        info!(
            node = %id,
            root = %store.root().display(),
            owned = ?RingPlacement::new(membership.size()).owned_indices(id),
            "Storage node ready"
        );

        Ok(Arc::new(Self::new(
            membership,
            store,
            peers,
            config.replication_attempts,
            config.announce_attempts,
        )))
    }

    pub fn id(&self) -> NodeId {
        self.membership.local_node.id
    }

    /// Every file this node holds a manifest for, sorted by id.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let manifests = self.store.list_manifests().await?;
        Ok(manifests
            .into_iter()
            .map(|(file_id, manifest)| {
                let name = if manifest.original_name.is_empty() {
                    file_id.clone()
                } else {
                    manifest.original_name
                };
                FileEntry { file_id, name }
            })
            .collect())
    }

    /// Persists fragments pushed by a peer and returns the hash of each one as
    /// it arrived.
    pub async fn store_received(
        &self,
        file_id: &str,
        fragments: &[(u32, Vec<u8>)],
    ) -> Result<Vec<(u32, String)>> {
        let ring_size = self.placement.ring_size();
        if let Some((index, _)) = fragments.iter().find(|(index, _)| *index >= ring_size) {
            return Err(StorageError::InvalidIndex(format!(
                "{} is outside the ring of {} nodes",
                index, ring_size
            )));
        }

        let mut receipts = Vec::with_capacity(fragments.len());
        for (index, data) in fragments {
            self.store.put(file_id, *index, data).await?;
            receipts.push((*index, super::hash::content_hash(data)));
        }

        info!(file_id = %file_id, count = receipts.len(), "Accepted pushed fragments");
        Ok(receipts)
    }

    /// Records a manifest announced by the uploading node. Re-announcing the
    /// same manifest leaves the node unchanged.
    pub async fn accept_manifest(&self, manifest: &Manifest) -> Result<()> {
        if manifest.file_id.is_empty() {
            return Err(StorageError::InvalidManifest("missing fileId".to_string()));
        }
        self.store.put_manifest(manifest).await?;
        info!(file_id = %manifest.file_id, "Accepted announced manifest");
        Ok(())
    }

    /// Serves a locally held fragment to a peer.
    pub async fn local_fragment(&self, file_id: &str, index: u32) -> Result<Vec<u8>> {
        self.store
            .get(file_id, index)
            .await?
            .ok_or_else(|| StorageError::FragmentNotFound {
                file_id: file_id.to_string(),
                index,
            })
    }
}
