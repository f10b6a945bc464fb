//! # Verification API
//!
//! Answers "is this file on the ledger?" from the reconciled feed. A typed
//! query is validated before the feed is consulted; a file is hashed
//! server-side and looked up exactly as a typed hash would be.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use custody_core::{ContentHash, QueryMode, VerificationQuery};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_json, read_file_field};
use crate::routes::RecordBody;
use crate::state::AppState;

/// Typed verification request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// `0x` + 64 hex in digest mode, a decimal in commitment mode.
    pub query: String,
    /// `digest` (default) or `commitment`.
    #[serde(default)]
    #[schema(value_type = String)]
    pub mode: QueryMode,
}

/// Verification result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    #[schema(value_type = String)]
    pub mode: QueryMode,
    /// The 32 bytes records were matched against, `0x` hex.
    pub target: String,
    pub matched: bool,
    /// Matching records, newest first.
    pub records: Vec<RecordBody>,
}

/// Build the typed verification router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/verify", post(verify))
}

/// Build the file verification router. Mounted with the upload body limit.
pub fn file_router() -> Router<AppState> {
    Router::new().route("/v1/verify/file", post(verify_file))
}

fn respond(state: &AppState, query: &VerificationQuery) -> VerifyResponse {
    let records: Vec<RecordBody> = state
        .feed
        .verify(query)
        .into_iter()
        .map(RecordBody::from)
        .collect();
    tracing::debug!(mode = ?query.mode(), matches = records.len(), "verification query");
    VerifyResponse {
        mode: query.mode(),
        target: ContentHash::from_bytes(query.target_bytes()).to_hex(),
        matched: !records.is_empty(),
        records,
    }
}

/// POST /v1/verify: Look up a typed hash or commitment.
#[utoipa::path(
    post,
    path = "/v1/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Lookup result", body = VerifyResponse),
        (status = 422, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "verify"
)]
pub(crate) async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let req = extract_json(body)?;
    let query = custody_feed::parse_typed(&req.query, req.mode)?;
    Ok(Json(respond(&state, &query)))
}

/// POST /v1/verify/file: Hash an uploaded file and look it up.
#[utoipa::path(
    post,
    path = "/v1/verify/file",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Lookup result", body = VerifyResponse),
        (status = 400, description = "No file field", body = crate::error::ErrorBody),
        (status = 413, description = "File too large", body = crate::error::ErrorBody),
    ),
    tag = "verify"
)]
pub(crate) async fn verify_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let file = read_file_field(multipart, state.store.max_bytes()).await?;
    let query = VerificationQuery::Hash(file.hash);
    Ok(Json(respond(&state, &query)))
}
