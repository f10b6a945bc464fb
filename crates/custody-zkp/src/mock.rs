//! # Mock Verifier
//!
//! A deterministic, transparent stand-in for a real Groth16 verifier, used
//! in development and tests. It provides **no zero-knowledge or soundness
//! guarantees**.
//!
//! ## How It Works
//!
//! The "binding" of a list of public inputs is the first 16 bytes of
//! `SHA256(inputs joined by ",")`, read as a big-endian integer and written
//! in decimal. [`MockVerifier::prove`] places the binding in `pi_a[0]`;
//! [`MockVerifier::verify`] recomputes it and checks equality. A mock proof
//! therefore verifies against exactly the inputs it was made for.

use custody_core::FieldElement;
use sha2::{Digest, Sha256};

use crate::proof::Groth16Proof;
use crate::traits::{ProofVerifier, VerifyError};

/// Deterministic mock verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockVerifier;

impl MockVerifier {
    /// Compute the binding value for a list of public inputs.
    pub fn binding(public_inputs: &[FieldElement]) -> String {
        let joined = public_inputs
            .iter()
            .map(FieldElement::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let digest = Sha256::digest(joined.as_bytes());
        let mut head = [0u8; 16];
        head.copy_from_slice(&digest[..16]);
        u128::from_be_bytes(head).to_string()
    }

    /// Produce a mock proof bound to `public_inputs`.
    pub fn prove(public_inputs: &[FieldElement]) -> Groth16Proof {
        let one = || "1".to_string();
        let zero = || "0".to_string();
        Groth16Proof {
            pi_a: [Self::binding(public_inputs), one(), one()],
            pi_b: [[zero(), zero()], [zero(), zero()], [one(), zero()]],
            pi_c: [zero(), zero(), one()],
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
        }
    }
}

impl ProofVerifier for MockVerifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn verify(
        &self,
        proof: &Groth16Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError> {
        proof
            .check_header()
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        let claimed = &proof.pi_a[0];
        if claimed.is_empty() || !claimed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VerifyError::MalformedProof(format!(
                "pi_a[0] is not a decimal integer: {claimed:?}"
            )));
        }
        let claimed = claimed.trim_start_matches('0');
        let expected = Self::binding(public_inputs);
        let expected = expected.trim_start_matches('0');
        Ok(claimed == expected)
    }
}
