//! HTTP client for the internal peer routes.
//!
//! Each call is a single request with connect and request timeouts. Callers
//! that need retries wrap the call in [`with_retry`].

use std::future::Future;
use std::time::Duration;

use super::protocol::{
    ENDPOINT_ANNOUNCE_FILE, ENDPOINT_GET_FRAGMENT, ENDPOINT_STORE_FRAGMENTS, Manifest,
    StoreFragmentsRequest, StoreFragmentsResponse,
};
use crate::error::{Result, StorageError};
use crate::membership::types::Node;

const INITIAL_BACKOFF_MS: u64 = 150;
const MAX_BACKOFF_MS: u64 = 1200;

pub struct PeerClient {
    http_client: reqwest::Client,
}

impl PeerClient {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        // One connection per exchange: no idle connections are kept around.
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self { http_client })
    }

    /// Pushes fragments to `node` and returns its acknowledgement.
    pub async fn store_fragments(
        &self,
        node: &Node,
        request: &StoreFragmentsRequest,
    ) -> Result<StoreFragmentsResponse> {
        let url = format!("{}{}", node.base_url(), ENDPOINT_STORE_FRAGMENTS);
        let response = self.http_client.post(url).json(request).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(StorageError::UnexpectedStatus {
                node: node.id,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn announce_file(&self, node: &Node, manifest: &Manifest) -> Result<()> {
        let url = format!("{}{}", node.base_url(), ENDPOINT_ANNOUNCE_FILE);
        let response = self.http_client.post(url).json(manifest).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(StorageError::UnexpectedStatus {
                node: node.id,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// `Ok(None)` when the peer answers that it does not hold the fragment.
    pub async fn get_fragment(
        &self,
        node: &Node,
        file_id: &str,
        index: u32,
    ) -> Result<Option<Vec<u8>>> {
        let url = format!("{}{}", node.base_url(), ENDPOINT_GET_FRAGMENT);
        let index_param = index.to_string();
        let response = self
            .http_client
            .get(url)
            .query(&[("fileId", file_id), ("index", index_param.as_str())])
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(Some(response.bytes().await?.to_vec())),
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(StorageError::UnexpectedStatus {
                node: node.id,
                status: status.as_u16(),
            }),
        }
    }
}

/// Runs `operation` up to `attempts` times, sleeping with exponential backoff
/// and jitter between failures. Returns the last error once the budget is
/// spent.
pub async fn with_retry<T, F, Fut>(attempts: usize, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut delay_ms = INITIAL_BACKOFF_MS;
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!("{} failed (attempt {}/{}): {}", label, attempt, attempts, e);
                if attempt >= attempts {
                    return Err(e);
                }
            }
        }

        let jitter = rand::random::<u64>() % 50;
        tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
        delay_ms = (delay_ms * 2).min(MAX_BACKOFF_MS);
        attempt += 1;
    }
}
