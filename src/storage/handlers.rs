use axum::{
    Json,
    async_trait,
    body::Bytes,
    extract::{Extension, FromRequestParts, Query},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use super::local::validate_file_id;
use super::node::StorageNode;
use super::protocol::{
    AnnounceResponse, DownloadParams, FileEntry, FragmentReceipt, GetFragmentParams, Manifest,
    StoreFragmentsRequest, StoreFragmentsResponse, UploadParams, UploadResponse,
};
use crate::error::{Result, StorageError};

pub async fn handle_status() -> &'static str {
    "OK"
}

pub async fn handle_list_files(
    Extension(node): Extension<Arc<StorageNode>>,
) -> Result<Json<Vec<FileEntry>>> {
    Ok(Json(node.list_files().await?))
}

pub async fn handle_upload(
    Extension(node): Extension<Arc<StorageNode>>,
    Query(params): Query<UploadParams>,
    _length: ContentLength,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let manifest = node.upload(&body, params.name.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id: manifest.file_id,
            name: manifest.original_name,
            size: body.len(),
        }),
    ))
}

pub async fn handle_download(
    Extension(node): Extension<Arc<StorageNode>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response> {
    let file_id = params
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or(StorageError::MissingParameter("fileId"))?;

    let file = node.download(&file_id).await?;

    let disposition = format!("attachment; filename=\"{}\"", file.name.replace('"', "'"));
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response())
}

pub async fn handle_store_fragments(
    Extension(node): Extension<Arc<StorageNode>>,
    _length: ContentLength,
    body: Bytes,
) -> Result<Json<StoreFragmentsResponse>> {
    let request: StoreFragmentsRequest = serde_json::from_slice(&body)
        .map_err(|e| StorageError::InvalidPayload(e.to_string()))?;
    validate_file_id(&request.file_id)?;

    let mut fragments = Vec::with_capacity(request.fragments.len());
    for payload in &request.fragments {
        let data = STANDARD.decode(payload.data.as_bytes()).map_err(|e| {
            StorageError::InvalidPayload(format!("fragment {}: {}", payload.index, e))
        })?;
        fragments.push((payload.index, data));
    }

    let received = node
        .store_received(&request.file_id, &fragments)
        .await?
        .into_iter()
        .map(|(index, hash)| FragmentReceipt { index, hash })
        .collect();

    Ok(Json(StoreFragmentsResponse {
        file_id: request.file_id,
        received,
    }))
}

pub async fn handle_announce_file(
    Extension(node): Extension<Arc<StorageNode>>,
    body: Bytes,
) -> Result<Json<AnnounceResponse>> {
    let manifest: Manifest = serde_json::from_slice(&body)
        .map_err(|e| StorageError::InvalidManifest(e.to_string()))?;
    if manifest.file_id.is_empty() {
        return Err(StorageError::InvalidManifest("missing fileId".to_string()));
    }
    validate_file_id(&manifest.file_id)?;

    node.accept_manifest(&manifest).await?;

    Ok(Json(AnnounceResponse {
        status: "OK".to_string(),
    }))
}

pub async fn handle_get_fragment(
    Extension(node): Extension<Arc<StorageNode>>,
    Query(params): Query<GetFragmentParams>,
) -> Result<Response> {
    let (Some(file_id), Some(index)) = (params.file_id, params.index) else {
        return Err(StorageError::MissingParameter("params"));
    };
    let index: u32 = index
        .trim()
        .parse()
        .map_err(|_| StorageError::InvalidIndex(index.clone()))?;

    let data = node.local_fragment(&file_id, index).await?;

    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        )],
        data,
    )
        .into_response())
}

pub async fn handle_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found\n")
}

/// Declared body length. Rejects with 411 from the request head alone, before
/// any of the body is read.
#[derive(Debug, Clone, Copy)]
pub struct ContentLength(pub u64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ContentLength {
    type Rejection = StorageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .map(ContentLength)
            .ok_or(StorageError::LengthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<ContentLength> {
        let (mut parts, _) = request.into_parts();
        ContentLength::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_content_length_read_from_head() {
        let request = Request::post("/upload").header("content-length", "42").body(()).unwrap();
        assert_eq!(extract(request).await.unwrap().0, 42);
    }

    #[tokio::test]
    async fn test_missing_or_garbled_content_length_is_411() {
        let chunked = Request::post("/upload")
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap();
        let err = extract(chunked).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::LENGTH_REQUIRED);

        let garbled = Request::post("/upload").header("content-length", "lots").body(()).unwrap();
        assert!(matches!(extract(garbled).await, Err(StorageError::LengthRequired)));
    }
}
