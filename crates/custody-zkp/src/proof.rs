//! # Proof Bundles
//!
//! Proofs arrive pre-generated in the JSON layout emitted by snarkjs:
//!
//! ```json
//! {
//!   "proof": {
//!     "pi_a": ["<x>", "<y>", "1"],
//!     "pi_b": [["<x.c0>", "<x.c1>"], ["<y.c0>", "<y.c1>"], ["1", "0"]],
//!     "pi_c": ["<x>", "<y>", "1"],
//!     "protocol": "groth16",
//!     "curve": "bn128"
//!   },
//!   "publicSignals": ["<decimal>", "..."]
//! }
//! ```
//!
//! Coordinates are decimal strings in projective form with `z = 1`. They
//! are base-field values and are checked by the verifier backend, not here.
//! Public signals are scalar-field elements and are validated on load.

use std::path::Path;

use custody_core::FieldElement;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating a proof bundle.
#[derive(Error, Debug)]
pub enum ProofFormatError {
    /// File could not be read.
    #[error("failed to read proof file: {0}")]
    Io(#[from] std::io::Error),
    /// File is not a valid bundle.
    #[error("invalid proof JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Protocol field is not `groth16`.
    #[error("unsupported proof protocol {0:?} (expected \"groth16\")")]
    UnsupportedProtocol(String),
    /// Curve field names a curve other than BN254.
    #[error("unsupported curve {0:?} (expected \"bn128\")")]
    UnsupportedCurve(String),
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

/// A Groth16 proof in snarkjs JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// G1 point `A`.
    pub pi_a: [String; 3],
    /// G2 point `B`, each coordinate as `[c0, c1]`.
    pub pi_b: [[String; 2]; 3],
    /// G1 point `C`.
    pub pi_c: [String; 3],
    /// Always `groth16`.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Always `bn128`.
    #[serde(default = "default_curve")]
    pub curve: String,
}

impl Groth16Proof {
    /// Reject proofs that name another protocol or curve.
    pub fn check_header(&self) -> Result<(), ProofFormatError> {
        if self.protocol != "groth16" {
            return Err(ProofFormatError::UnsupportedProtocol(self.protocol.clone()));
        }
        if !matches!(self.curve.as_str(), "bn128" | "bn254") {
            return Err(ProofFormatError::UnsupportedCurve(self.curve.clone()));
        }
        Ok(())
    }
}

/// A proof together with the public signals it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// The proof.
    pub proof: Groth16Proof,
    /// Public inputs, in circuit order.
    #[serde(rename = "publicSignals")]
    pub public_signals: Vec<FieldElement>,
}

impl ProofBundle {
    /// Parse a bundle from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ProofFormatError> {
        let bundle: Self = serde_json::from_str(text)?;
        bundle.proof.check_header()?;
        Ok(bundle)
    }

    /// Load a bundle from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProofFormatError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "proof": {
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        },
        "publicSignals": ["42", "0007"]
    }"#;

    #[test]
    fn parses_snarkjs_layout() {
        let bundle = ProofBundle::from_json(BUNDLE).unwrap();
        assert_eq!(bundle.proof.pi_b[1][0], "5");
        assert_eq!(bundle.public_signals[1].as_str(), "7");
    }

    #[test]
    fn header_defaults_when_absent() {
        let text = r#"{"proof":{"pi_a":["1","2","1"],"pi_b":[["1","0"],["1","0"],["1","0"]],"pi_c":["1","2","1"]},"publicSignals":[]}"#;
        let bundle = ProofBundle::from_json(text).unwrap();
        assert_eq!(bundle.proof.protocol, "groth16");
    }

    #[test]
    fn other_protocols_are_rejected() {
        let text = BUNDLE.replace("\"groth16\"", "\"plonk\"");
        assert!(matches!(
            ProofBundle::from_json(&text),
            Err(ProofFormatError::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn short_point_is_rejected() {
        let text = BUNDLE.replace(r#"["7", "8", "1"]"#, r#"["7", "8"]"#);
        assert!(matches!(ProofBundle::from_json(&text), Err(ProofFormatError::Json(_))));
    }

    #[test]
    fn out_of_field_signal_is_rejected() {
        let text = BUNDLE.replace("\"42\"", &format!("\"{}\"", custody_core::BN254_SCALAR_MODULUS));
        assert!(ProofBundle::from_json(&text).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof.json");
        std::fs::write(&path, BUNDLE).unwrap();
        assert_eq!(ProofBundle::load(&path).unwrap().public_signals.len(), 2);
    }
}
