//! # Groth16 Verifier (Feature-Gated)
//!
//! Real Groth16 verification on BN254 via arkworks, enabled by the
//! `groth16` Cargo feature. The verifying key is read from the JSON file
//! snarkjs exports (`verification_key.json`).
//!
//! Every point from the key or the proof is decoded with
//! `new_unchecked` and then explicitly checked to lie on the curve and in
//! the prime-order subgroup before it reaches the pairing.

use std::path::Path;
use std::str::FromStr;

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use custody_core::FieldElement;
use serde::Deserialize;

use crate::proof::{Groth16Proof, ProofFormatError};
use crate::traits::{ProofVerifier, VerifyError};

/// Verifying key as exported by snarkjs.
#[derive(Debug, Clone, Deserialize)]
pub struct SnarkjsVerifyingKey {
    /// Always `groth16`.
    pub protocol: String,
    /// Number of public inputs.
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    /// `alpha` in G1.
    pub vk_alpha_1: [String; 3],
    /// `beta` in G2.
    pub vk_beta_2: [[String; 2]; 3],
    /// `gamma` in G2.
    pub vk_gamma_2: [[String; 2]; 3],
    /// `delta` in G2.
    pub vk_delta_2: [[String; 2]; 3],
    /// Input commitment bases, `nPublic + 1` G1 points.
    #[serde(rename = "IC")]
    pub ic: Vec<[String; 3]>,
}

fn fq(value: &str, what: &str) -> Result<Fq, String> {
    Fq::from_str(value).map_err(|_| format!("{what}: not a base field element: {value:?}"))
}

fn g1(point: &[String; 3], what: &str) -> Result<G1Affine, String> {
    if point[2] != "1" {
        return Err(format!("{what}: expected affine point with z = 1"));
    }
    let p = G1Affine::new_unchecked(fq(&point[0], what)?, fq(&point[1], what)?);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(format!("{what}: point is not on the BN254 G1 curve"));
    }
    Ok(p)
}

fn g2(point: &[[String; 2]; 3], what: &str) -> Result<G2Affine, String> {
    if point[2][0] != "1" || point[2][1] != "0" {
        return Err(format!("{what}: expected affine point with z = 1"));
    }
    let x = Fq2::new(fq(&point[0][0], what)?, fq(&point[0][1], what)?);
    let y = Fq2::new(fq(&point[1][0], what)?, fq(&point[1][1], what)?);
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(format!("{what}: point is not on the BN254 G2 curve"));
    }
    Ok(p)
}

impl SnarkjsVerifyingKey {
    /// Decode into an arkworks verifying key.
    pub fn to_arkworks(&self) -> Result<VerifyingKey<Bn254>, VerifyError> {
        if self.protocol != "groth16" {
            return Err(VerifyError::InvalidKey(format!(
                "unsupported protocol {:?}",
                self.protocol
            )));
        }
        if self.ic.len() != self.n_public + 1 {
            return Err(VerifyError::InvalidKey(format!(
                "IC has {} points, expected nPublic + 1 = {}",
                self.ic.len(),
                self.n_public + 1
            )));
        }
        let gamma_abc_g1 = self
            .ic
            .iter()
            .enumerate()
            .map(|(i, p)| g1(p, &format!("IC[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map_err(VerifyError::InvalidKey)?;
        Ok(VerifyingKey {
            alpha_g1: g1(&self.vk_alpha_1, "vk_alpha_1").map_err(VerifyError::InvalidKey)?,
            beta_g2: g2(&self.vk_beta_2, "vk_beta_2").map_err(VerifyError::InvalidKey)?,
            gamma_g2: g2(&self.vk_gamma_2, "vk_gamma_2").map_err(VerifyError::InvalidKey)?,
            delta_g2: g2(&self.vk_delta_2, "vk_delta_2").map_err(VerifyError::InvalidKey)?,
            gamma_abc_g1,
        })
    }
}

/// Groth16 verifier over BN254 with a fixed verifying key.
pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
    n_public: usize,
}

impl std::fmt::Debug for Groth16Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Groth16Verifier")
            .field("n_public", &self.n_public)
            .finish_non_exhaustive()
    }
}

impl Groth16Verifier {
    /// Build a verifier from a decoded snarkjs key.
    pub fn new(vk: &SnarkjsVerifyingKey) -> Result<Self, VerifyError> {
        let vk = vk.to_arkworks()?;
        let n_public = vk.gamma_abc_g1.len().saturating_sub(1);
        Ok(Self {
            pvk: prepare_verifying_key(&vk),
            n_public,
        })
    }

    /// Parse a snarkjs verifying key from JSON text.
    pub fn from_json(text: &str) -> Result<Self, VerifyError> {
        let vk: SnarkjsVerifyingKey = serde_json::from_str(text)
            .map_err(|e| VerifyError::InvalidKey(format!("invalid verifying key JSON: {e}")))?;
        Self::new(&vk)
    }

    /// Load a snarkjs `verification_key.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VerifyError::InvalidKey(ProofFormatError::Io(e).to_string())
        })?;
        Self::from_json(&text)
    }

    /// Number of public inputs the key expects.
    pub fn n_public(&self) -> usize {
        self.n_public
    }
}

impl ProofVerifier for Groth16Verifier {
    fn name(&self) -> &'static str {
        "groth16"
    }

    fn verify(
        &self,
        proof: &Groth16Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError> {
        proof
            .check_header()
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        if public_inputs.len() != self.n_public {
            return Err(VerifyError::InvalidInputs(format!(
                "expected {} public inputs, got {}",
                self.n_public,
                public_inputs.len()
            )));
        }
        let proof = Proof::<Bn254> {
            a: g1(&proof.pi_a, "pi_a").map_err(VerifyError::MalformedProof)?,
            b: g2(&proof.pi_b, "pi_b").map_err(VerifyError::MalformedProof)?,
            c: g1(&proof.pi_c, "pi_c").map_err(VerifyError::MalformedProof)?,
        };
        let inputs = public_inputs
            .iter()
            .map(|f| {
                Fr::from_str(f.as_str())
                    .map_err(|_| VerifyError::InvalidInputs(format!("not a scalar: {f}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let valid = Groth16::<Bn254>::verify_proof(&self.pvk, &proof, &inputs)
            .map_err(|e| VerifyError::InvalidKey(e.to_string()))?;
        tracing::debug!(valid, "groth16 verification finished");
        Ok(valid)
    }
}
