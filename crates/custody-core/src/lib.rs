#![deny(missing_docs)]

//! # custody-core: Foundational Types for the Custody Stack
//!
//! Every other crate in the workspace depends on this one. It has no
//! internal crate dependencies, only `serde`, `serde_json`, `thiserror`,
//! `chrono`, `sha3`, and `hex` from the ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`ContentHash`] is not
//!    an [`Address`] and neither is a bare string. Parsing happens once, at
//!    the boundary, and yields a [`ValidationError`] on bad input.
//!
//! 2. **Keccak-256 is the only content digest.** [`ContentHash::of`] and
//!    [`Keccak256Accumulator`] are the sole paths to computing one, so the
//!    store, the ledger, and the verifier can never disagree on a hash.
//!
//! 3. **Queries are validated before they are run.** A
//!    [`VerificationQuery`] can only exist in a well-formed state.

pub mod digest;
pub mod error;
pub mod field;
pub mod identity;
pub mod metadata;
pub mod query;
pub mod temporal;

pub use digest::{keccak256, ContentHash, Keccak256Accumulator, HASH_LEN};
pub use error::{CustodyError, ValidationError};
pub use field::{FieldElement, BN254_SCALAR_MODULUS};
pub use identity::Address;
pub use metadata::{
    validate_file_url, validate_metadata_ref, CachedMetadata, MetadataRef, MAX_FILE_URL_LEN,
    MAX_METADATA_REF_LEN,
};
pub use query::{QueryMode, VerificationQuery};
pub use temporal::Timestamp;
