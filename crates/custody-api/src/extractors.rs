//! # Custom Extractors
//!
//! Helpers that turn axum rejections into [`AppError`]s and read the single
//! `file` field of a multipart upload under a size ceiling, hashing it
//! chunk by chunk as it arrives.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use custody_core::{ContentHash, Keccak256Accumulator};

use crate::error::AppError;

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// A file read from a multipart request.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Exact bytes.
    pub bytes: Vec<u8>,
    /// Content hash of `bytes`.
    pub hash: ContentHash,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Read the `file` field, rejecting it as soon as it grows past `limit`.
///
/// Other fields are skipped. A request without a `file` field is a client
/// error.
pub async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
    limit: u64,
) -> Result<UploadedFile, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let mut bytes = Vec::new();
        let mut hasher = Keccak256Accumulator::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "file exceeds limit of {limit} bytes"
                )));
            }
            hasher.update(&chunk);
            bytes.extend_from_slice(&chunk);
        }
        return Ok(UploadedFile {
            file_name,
            bytes,
            hash: hasher.finalize(),
        });
    }

    Err(AppError::BadRequest(format!(
        "multipart field \"{FILE_FIELD}\" is required"
    )))
}
