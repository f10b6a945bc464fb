//! # custody-zkp: Proof Gate for the Evidence Ledger
//!
//! Proof *generation* happens outside this system. What arrives here is a
//! pre-generated snarkjs proof bundle; this crate models it and decides,
//! through a [`ProofVerifier`], whether an append may proceed.
//!
//! ## Backends
//!
//! - [`MockVerifier`]: deterministic and transparent, always available.
//! - `Groth16Verifier`: arkworks BN254 pairing check, behind the `groth16`
//!   feature.

pub mod mock;
pub mod proof;
pub mod traits;

#[cfg(feature = "groth16")]
pub mod groth16;

pub use mock::MockVerifier;
pub use proof::{Groth16Proof, ProofBundle, ProofFormatError};
pub use traits::{ProofVerifier, VerifyError};

#[cfg(feature = "groth16")]
pub use groth16::{Groth16Verifier, SnarkjsVerifyingKey};
