//! # Verification Queries
//!
//! A verification query asks "which ledger records carry this value?". The
//! value is either a content hash (recomputed from a file or typed by the
//! user) or, in commitment mode, a decimal field element whose 32-byte
//! big-endian encoding is compared against the recorded hash bytes.
//!
//! Queries are validated here, before any provider is contacted.

use serde::{Deserialize, Serialize};

use crate::digest::ContentHash;
use crate::error::ValidationError;
use crate::field::FieldElement;

/// How a typed query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// `0x` + 64 hex digits.
    #[default]
    Digest,
    /// Decimal BN254 scalar.
    Commitment,
}

/// A validated verification query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationQuery {
    /// Match records whose content hash equals this one.
    Hash(ContentHash),
    /// Match records whose content hash bytes equal this element's encoding.
    Commitment(FieldElement),
}

impl VerificationQuery {
    /// Validate a typed query under an explicit mode.
    pub fn parse(input: &str, mode: QueryMode) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        match mode {
            QueryMode::Digest => ContentHash::parse(trimmed).map(Self::Hash),
            QueryMode::Commitment => FieldElement::parse(trimmed).map(Self::Commitment),
        }
    }

    /// Query for the hash of a file's bytes.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self::Hash(ContentHash::of(bytes))
    }

    /// The 32 bytes a record's content hash must equal.
    pub fn target_bytes(&self) -> [u8; 32] {
        match self {
            Self::Hash(h) => *h.as_bytes(),
            Self::Commitment(f) => f.to_be_bytes(),
        }
    }

    /// Whether a recorded content hash satisfies this query.
    pub fn matches(&self, hash: &ContentHash) -> bool {
        hash.as_bytes() == &self.target_bytes()
    }

    /// The mode this query was validated under.
    pub fn mode(&self) -> QueryMode {
        match self {
            Self::Hash(_) => QueryMode::Digest,
            Self::Commitment(_) => QueryMode::Commitment,
        }
    }
}
