//! # custody-store: Write-Once Content Store
//!
//! Files are stored once, under their Keccak-256 content hash plus the
//! original extension, marked read-only, and integrity-checked on every
//! read. See [`cas`] for the invariants.

pub mod cas;
pub mod error;
pub mod naming;

pub use cas::{ContentStore, StoredBlob, DEFAULT_MAX_BYTES};
pub use error::StoreError;
pub use naming::{sanitize_extension, StorageName, MAX_EXTENSION_LEN};
