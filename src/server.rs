//! HTTP surface of a storage node.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Extension, Request, State},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::NodeConfig;
use crate::storage::handlers::*;
use crate::storage::node::StorageNode;
use crate::storage::protocol::{
    ENDPOINT_ANNOUNCE_FILE, ENDPOINT_DOWNLOAD, ENDPOINT_FILES, ENDPOINT_GET_FRAGMENT,
    ENDPOINT_STATUS, ENDPOINT_STORE_FRAGMENTS, ENDPOINT_UPLOAD,
};

#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    pub max_concurrent_requests: usize,
    pub max_body_bytes: usize,
}

impl From<&NodeConfig> for ServerLimits {
    fn from(config: &NodeConfig) -> Self {
        Self {
            max_concurrent_requests: config.max_concurrent_requests,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Routes of a node. Every unknown path or method answers 404.
///
/// Only the client routes count against `max_concurrent_requests`. An upload
/// keeps its slot while it pushes to peers, so the peer routes must never wait
/// behind it.
pub fn router(node: Arc<StorageNode>, limits: &ServerLimits) -> Router {
    let slots = Arc::new(Semaphore::new(limits.max_concurrent_requests.max(1)));

    let client = Router::new()
        .route(ENDPOINT_STATUS, get(handle_status).fallback(handle_not_found))
        .route(ENDPOINT_FILES, get(handle_list_files).fallback(handle_not_found))
        .route(ENDPOINT_UPLOAD, post(handle_upload).fallback(handle_not_found))
        .route(ENDPOINT_DOWNLOAD, get(handle_download).fallback(handle_not_found))
        .route_layer(middleware::from_fn_with_state(slots, limit_concurrency));

    let internal = Router::new()
        .route(
            ENDPOINT_STORE_FRAGMENTS,
            post(handle_store_fragments).fallback(handle_not_found),
        )
        .route(
            ENDPOINT_ANNOUNCE_FILE,
            post(handle_announce_file).fallback(handle_not_found),
        )
        .route(
            ENDPOINT_GET_FRAGMENT,
            get(handle_get_fragment).fallback(handle_not_found),
        );

    client
        .merge(internal)
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .layer(Extension(node))
        .layer(middleware::map_response(close_connection))
}

/// Holds one permit for the lifetime of each request; callers beyond the
/// limit wait here.
async fn limit_concurrency(
    State(slots): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    let _permit = slots.acquire_owned().await;
    next.run(request).await
}

/// One exchange per connection.
async fn close_connection(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Serves `node` on `listener` until the process ends.
pub async fn serve(
    listener: TcpListener,
    node: Arc<StorageNode>,
    limits: &ServerLimits,
) -> std::io::Result<()> {
    let app = router(node, limits);
    axum::serve(listener, app).await
}
