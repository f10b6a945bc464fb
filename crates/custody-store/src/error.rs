//! # Store Error Types

use thiserror::Error;

/// Errors from content store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The blob exceeds the configured size ceiling.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Observed size (or the size at which reading stopped).
        size: u64,
        /// Configured ceiling.
        limit: u64,
    },

    /// A storage name failed validation.
    #[error("invalid storage name: {0:?}")]
    InvalidName(String),

    /// Stored bytes no longer hash to the name they are stored under.
    #[error("integrity violation: {name} has content hash {actual}")]
    Integrity {
        /// The storage name that was read.
        name: String,
        /// The hash recomputed from the bytes on disk.
        actual: String,
    },

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
