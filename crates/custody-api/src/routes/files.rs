//! # Content Store API
//!
//! `POST /upload` stores a file once under its content hash and returns the
//! canonical hash and download URL. `GET /files/{name}` serves stored bytes
//! read-only with long-lived caching and forced-download headers; any other
//! method on that path is refused with 405.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use custody_store::StorageName;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::read_file_field;
use crate::state::AppState;

/// Upload result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    /// `0x`-prefixed Keccak-256 of the uploaded bytes.
    pub content_hash_hex: String,
    /// The same digest without the prefix.
    pub digest_hex: String,
    /// Storage name.
    pub filename: String,
    /// Public download URL.
    pub url: String,
}

/// Build the content store router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route(
            "/files/{name}",
            get(download).fallback(method_not_allowed),
        )
}

/// POST /upload: Store a file under its content hash.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "File stored (or already present)", body = UploadResponse),
        (status = 400, description = "No file field", body = crate::error::ErrorBody),
        (status = 413, description = "File too large", body = crate::error::ErrorBody),
    ),
    tag = "files"
)]
pub(crate) async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let file = read_file_field(multipart, state.store.max_bytes()).await?;

    let store = state.store.clone();
    let blob = tokio::task::spawn_blocking(move || store.put(file.file_name.as_deref(), &file.bytes))
        .await
        .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))??;

    let filename = blob.storage_name.to_string();
    tracing::info!(
        content_hash = %blob.hash,
        filename = %filename,
        size = blob.size,
        created = blob.created,
        "upload stored"
    );

    Ok(Json(UploadResponse {
        ok: true,
        content_hash_hex: blob.hash.to_hex(),
        digest_hex: blob.hash.to_bare_hex(),
        url: state.config.file_url(&filename),
        filename,
    }))
}

/// GET /files/{name}: Download a stored file.
#[utoipa::path(
    get,
    path = "/files/{name}",
    params(("name" = String, Path, description = "Storage name, `0x<hash>[.ext]`")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 405, description = "Method not allowed", body = crate::error::ErrorBody),
    ),
    tag = "files"
)]
pub(crate) async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("file {name} not found"));
    if StorageName::parse(&name).is_err() {
        return Err(not_found());
    }

    let store = state.store.clone();
    let lookup = name.clone();
    let bytes = tokio::task::spawn_blocking(move || store.get(&lookup))
        .await
        .map_err(|e| AppError::Internal(format!("download task failed: {e}")))??
        .ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        bytes,
    )
        .into_response())
}

async fn method_not_allowed() -> Response {
    let mut response =
        AppError::MethodNotAllowed("stored files are read-only".to_string()).into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, header::HeaderValue::from_static("GET, HEAD"));
    response
}
