//! # Evidence Ledger API
//!
//! Write and read the per-submitter evidence lists. Submissions are
//! validated before anything is written; a proof-gated submission that
//! fails verification leaves no record, event or block behind.
//!
//! When `metadataRef` is a reference hash, an optional `note` is stored in
//! the metadata cache under that reference before the append, so the feed
//! can show it as soon as the event arrives. The cache is keyed by
//! reference, not by record; a rejected proof does not remove the entry.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use custody_core::{
    Address, CachedMetadata, ContentHash, FieldElement, MetadataRef, ValidationError,
    MAX_METADATA_REF_LEN,
};
use custody_ledger::{AppendEvent, Submission};
use custody_zkp::Groth16Proof;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::EventBody;
use crate::state::AppState;

/// Request to append a record.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Account the record is attributed to (`0x` + 40 hex).
    pub submitter: String,
    /// Keccak-256 of the file bytes (`0x` + 64 hex).
    pub content_hash: String,
    /// Inline metadata text or a metadata document hash.
    pub metadata_ref: String,
    #[serde(default)]
    pub file_url: Option<String>,
    /// Note cached under a referenced `metadataRef`.
    #[serde(default)]
    pub note: Option<String>,
}

/// Request to append a record gated on a Groth16 proof.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWithProofRequest {
    #[serde(flatten)]
    pub record: SubmitRequest,
    /// snarkjs proof object (`pi_a`, `pi_b`, `pi_c`, `protocol`, `curve`).
    #[schema(value_type = Object)]
    pub proof: Groth16Proof,
    /// Decimal public inputs.
    pub public_inputs: Vec<String>,
}

/// Record count for a submitter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub submitter: String,
    pub count: u64,
}

struct ParsedSubmission {
    submitter: Address,
    submission: Submission,
    cached: Option<CachedMetadata>,
}

impl SubmitRequest {
    fn parse(self) -> Result<ParsedSubmission, ValidationError> {
        let submitter = Address::parse(&self.submitter)?;
        let submission = Submission {
            content_hash: ContentHash::parse(&self.content_hash)?,
            metadata_ref: self.metadata_ref,
            file_url: self.file_url,
        };
        submission.validate()?;

        let cached = match self.note {
            None => None,
            Some(note) => {
                if !MetadataRef::classify(&submission.metadata_ref).is_reference() {
                    return Err(ValidationError::InvalidField {
                        field: "note",
                        reason: "only applies when metadataRef is a reference hash".into(),
                    });
                }
                if note.chars().count() > MAX_METADATA_REF_LEN {
                    return Err(ValidationError::InvalidField {
                        field: "note",
                        reason: format!("exceeds {MAX_METADATA_REF_LEN} characters"),
                    });
                }
                Some(CachedMetadata {
                    note: Some(note),
                    file_url: submission.file_url.clone(),
                })
            }
        };

        Ok(ParsedSubmission {
            submitter,
            submission,
            cached,
        })
    }
}

/// Build the evidence router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/evidence", post(submit))
        .route("/v1/evidence/proof", post(submit_with_proof))
        .route("/v1/evidence/{submitter}/count", get(count))
        .route("/v1/evidence/{submitter}/{index}", get(get_record))
}

fn cache_metadata(state: &AppState, parsed: &ParsedSubmission) -> Result<(), AppError> {
    if let Some(doc) = &parsed.cached {
        state
            .cache
            .put(&parsed.submission.metadata_ref, doc.clone())
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    Ok(())
}

/// POST /v1/evidence: Append a record without a proof.
#[utoipa::path(
    post,
    path = "/v1/evidence",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Record appended", body = EventBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventBody>), AppError> {
    let parsed = extract_json(body)?.parse()?;
    cache_metadata(&state, &parsed)?;

    let ledger = state.ledger.clone();
    let event = tokio::task::spawn_blocking(move || {
        ledger.submit(parsed.submitter, parsed.submission)
    })
    .await
    .map_err(|e| AppError::Internal(format!("append task failed: {e}")))??;

    log_append(&event, false);
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// POST /v1/evidence/proof: Append a record gated on a proof.
#[utoipa::path(
    post,
    path = "/v1/evidence/proof",
    request_body = SubmitWithProofRequest,
    responses(
        (status = 201, description = "Proof verified, record appended", body = EventBody),
        (status = 422, description = "Validation failed or proof rejected", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn submit_with_proof(
    State(state): State<AppState>,
    body: Result<Json<SubmitWithProofRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventBody>), AppError> {
    let req = extract_json(body)?;
    let inputs = req
        .public_inputs
        .iter()
        .map(|s| FieldElement::parse(s))
        .collect::<Result<Vec<_>, _>>()?;
    let proof = req.proof;
    let parsed = req.record.parse()?;

    cache_metadata(&state, &parsed)?;

    let ledger = state.ledger.clone();
    let event = tokio::task::spawn_blocking(move || {
        ledger.submit_with_proof(parsed.submitter, parsed.submission, &proof, &inputs)
    })
    .await
    .map_err(|e| AppError::Internal(format!("append task failed: {e}")))??;

    log_append(&event, true);
    Ok((StatusCode::CREATED, Json(event.into())))
}

fn log_append(event: &AppendEvent, proven: bool) {
    tracing::info!(
        submitter = %event.submitter,
        content_hash = %event.content_hash,
        block = event.position.block_number,
        proven,
        "evidence appended"
    );
}

/// GET /v1/evidence/{submitter}/count: Number of records a submitter has.
#[utoipa::path(
    get,
    path = "/v1/evidence/{submitter}/count",
    params(("submitter" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Record count", body = CountResponse),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn count(
    State(state): State<AppState>,
    Path(submitter): Path<String>,
) -> Result<Json<CountResponse>, AppError> {
    let submitter = Address::parse(&submitter)?;
    Ok(Json(CountResponse {
        submitter: submitter.to_hex(),
        count: state.ledger.count(&submitter),
    }))
}

/// GET /v1/evidence/{submitter}/{index}: A submitter's record by index.
#[utoipa::path(
    get,
    path = "/v1/evidence/{submitter}/{index}",
    params(
        ("submitter" = String, Path, description = "Account address"),
        ("index" = u64, Path, description = "Zero-based index in the submitter's list"),
    ),
    responses(
        (status = 200, description = "Record found", body = EventBody),
        (status = 404, description = "Index out of range", body = crate::error::ErrorBody),
    ),
    tag = "evidence"
)]
pub(crate) async fn get_record(
    State(state): State<AppState>,
    Path((submitter, index)): Path<(String, u64)>,
) -> Result<Json<EventBody>, AppError> {
    let submitter = Address::parse(&submitter)?;
    let event = state.ledger.get(&submitter, index)?;
    Ok(Json(event.into()))
}
