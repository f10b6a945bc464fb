//! # Proof Verifier Trait
//!
//! The ledger's proof gate is a pure predicate over a proof and its public
//! inputs. Backends (the deterministic mock, the arkworks Groth16 verifier)
//! implement [`ProofVerifier`] and are held as `Arc<dyn ProofVerifier>`, so
//! the gate can be swapped at startup without touching the ledger.
//!
//! ## Outcomes
//!
//! - `Ok(true)`: the proof verifies against the inputs.
//! - `Ok(false)`: well-formed, but does not verify.
//! - `Err(_)`: malformed proof, inputs, or key.
//!
//! The ledger treats anything other than `Ok(true)` as a rejection.

use custody_core::FieldElement;
use thiserror::Error;

use crate::proof::Groth16Proof;

/// Error during proof verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The public inputs do not fit the verifying key.
    #[error("invalid public inputs: {0}")]
    InvalidInputs(String),
    /// The verifying key is unusable.
    #[error("invalid verifying key: {0}")]
    InvalidKey(String),
}

/// A swappable proof verification predicate.
///
/// Requires `Send + Sync` so one verifier can be shared across request
/// handlers.
pub trait ProofVerifier: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Verify `proof` against `public_inputs`.
    fn verify(
        &self,
        proof: &Groth16Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError>;
}
