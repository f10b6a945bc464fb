//! # Ledger Error Types

use custody_core::{Address, ValidationError};
use custody_zkp::VerifyError;
use thiserror::Error;

/// Errors from ledger writes and reads.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A submission field failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The proof was well-formed but did not verify.
    #[error("proof rejected by {verifier} verifier")]
    ProofRejected {
        /// Backend that rejected the proof.
        verifier: &'static str,
    },

    /// The proof, inputs, or key could not be evaluated.
    #[error("proof could not be verified: {0}")]
    MalformedProof(#[from] VerifyError),

    /// No record at the requested index.
    #[error("no record {index} for {submitter} (count {count})")]
    IndexOutOfRange {
        /// Submitter queried.
        submitter: Address,
        /// Requested index.
        index: u64,
        /// Records the submitter has.
        count: u64,
    },

    /// The journal could not be written or replayed.
    #[error("journal error: {0}")]
    Journal(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from chain read queries (in-process or remote).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// `from` is past `to`.
    #[error("invalid block range: from {from} is after to {to}")]
    InvalidRange {
        /// Requested start.
        from: u64,
        /// Requested end.
        to: u64,
    },

    /// Range wider than the host's per-query limit.
    #[error("block range {from}..={to} spans more than {limit} blocks")]
    RangeTooLarge {
        /// Requested start.
        from: u64,
        /// Requested end.
        to: u64,
        /// Host limit.
        limit: u64,
    },

    /// Provider could not be reached.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// Provider refused the query.
    #[error("provider rejected query: {0}")]
    Rejected(String),

    /// Provider answered with something that could not be decoded.
    #[error("malformed provider response: {0}")]
    Decode(String),
}
