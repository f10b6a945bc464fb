//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from custody-store, custody-ledger, custody-feed and
//! custody-core to HTTP status codes with a JSON body carrying a
//! machine-readable code and a message. Internal details are logged, never
//! returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use custody_core::ValidationError;
use custody_feed::FeedError;
use custody_ledger::{ChainError, LedgerError};
use custody_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "PROOF_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Upload exceeds the size ceiling (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Method not allowed on this path (405).
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The proof gate refused the append (422).
    #[error("proof rejected: {0}")]
    ProofRejected(String),

    /// A dependency is not ready (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::ProofRejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PROOF_REJECTED"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            StoreError::InvalidName(_) => Self::BadRequest(err.to_string()),
            StoreError::Integrity { .. } | StoreError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(e) => e.into(),
            LedgerError::ProofRejected { .. } | LedgerError::MalformedProof(_) => {
                Self::ProofRejected(err.to_string())
            }
            LedgerError::IndexOutOfRange { .. } => Self::NotFound(err.to_string()),
            LedgerError::Journal(_) | LedgerError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidRange { .. } | ChainError::RangeTooLarge { .. } => {
                Self::Validation(err.to_string())
            }
            ChainError::Unreachable(_) => Self::Unavailable(err.to_string()),
            ChainError::Rejected(_) | ChainError::Decode(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Validation(e) => e.into(),
            FeedError::Chain(e) => e.into(),
            FeedError::Cancelled => Self::Unavailable(err.to_string()),
            FeedError::InvalidChunkSize | FeedError::Cache(_) | FeedError::Io(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
