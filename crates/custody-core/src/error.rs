//! # Error Hierarchy
//!
//! Structured error types shared by every crate in the custody stack,
//! built with `thiserror`. Library code never boxes errors or unwraps outside tests.
//!
//! Validation errors carry the offending input so that operators and API
//! clients can see exactly what was rejected without guesswork.

use thiserror::Error;

/// Top-level error type for the custody stack.
#[derive(Error, Debug)]
pub enum CustodyError {
    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Integrity violation: stored bytes no longer match their content hash.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes and typed queries.
///
/// Every variant is raised before any side effect (storage write, ledger
/// append, provider query) is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Content hash is not `0x` followed by exactly 64 hex digits.
    #[error("invalid content hash: \"{0}\" (expected 0x followed by 64 hex digits)")]
    InvalidContentHash(String),

    /// Account address is not `0x` followed by exactly 40 hex digits.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex digits)")]
    InvalidAddress(String),

    /// Field element is not a canonical decimal below the BN254 scalar modulus.
    #[error("invalid field element: \"{value}\" ({reason})")]
    InvalidFieldElement {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A typed verification query was empty after trimming.
    #[error("verification query must not be empty")]
    EmptyQuery,

    /// A free-form text field exceeded its length ceiling or was empty.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name as seen by the caller.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_custody_error() {
        let err: CustodyError = ValidationError::EmptyQuery.into();
        assert!(format!("{err}").contains("validation error"));
    }

    #[test]
    fn invalid_hash_message_carries_input() {
        let err = ValidationError::InvalidContentHash("0xzz".into());
        assert!(err.to_string().contains("0xzz"));
        assert!(err.to_string().contains("64 hex"));
    }

    #[test]
    fn invalid_field_message_names_field() {
        let err = ValidationError::InvalidField {
            field: "metadataRef",
            reason: "must not be empty".into(),
        };
        assert_eq!(err.to_string(), "invalid metadataRef: must not be empty");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CustodyError = io.into();
        assert!(matches!(err, CustodyError::Io(_)));
    }
}
