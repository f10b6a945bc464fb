//! # Feed Error Types

use custody_core::ValidationError;
use custody_ledger::ChainError;
use thiserror::Error;

/// Errors from building or querying the reconciled feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The chain provider failed.
    #[error("chain provider error: {0}")]
    Chain(#[from] ChainError),

    /// A query failed validation before any provider call.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The load cycle was torn down before it finished.
    #[error("load cancelled")]
    Cancelled,

    /// Chunk size of zero.
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    /// The metadata cache could not be read or written.
    #[error("metadata cache error: {0}")]
    Cache(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
