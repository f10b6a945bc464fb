//! # Proof Subcommand
//!
//! Offline tooling for the ledger's proof gate.
//!
//! - `proof check` verifies a snarkjs bundle (`{ proof, publicSignals }`)
//!   with the Groth16 verifier when `--vk` is given, or with the mock
//!   verifier otherwise. Groth16 needs the `groth16` build feature.
//! - `proof mock` writes a mock bundle for the given public inputs, for
//!   exercising `submit --proof` against a server running the mock
//!   verifier.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use custody_core::FieldElement;
use custody_zkp::{MockVerifier, ProofBundle, ProofVerifier};

/// Arguments for the `custody proof` subcommand.
#[derive(Args, Debug)]
pub struct ProofArgs {
    #[command(subcommand)]
    pub command: ProofCommand,
}

/// Proof subcommands.
#[derive(Subcommand, Debug)]
pub enum ProofCommand {
    /// Verify a proof bundle.
    Check {
        /// Bundle file (`{ proof, publicSignals }`).
        #[arg(value_name = "BUNDLE")]
        bundle: PathBuf,
        /// snarkjs `verification_key.json`; omit to use the mock verifier.
        #[arg(long, value_name = "FILE")]
        vk: Option<PathBuf>,
    },

    /// Write a mock proof bundle.
    Mock {
        /// Decimal public inputs, in circuit order.
        #[arg(long, value_delimiter = ',', required = true)]
        inputs: Vec<String>,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

/// Execute the proof subcommand.
pub fn run_proof(args: &ProofArgs) -> Result<u8> {
    match &args.command {
        ProofCommand::Check { bundle, vk } => cmd_check(bundle, vk.as_deref()),
        ProofCommand::Mock { inputs, out } => cmd_mock(inputs, out.as_deref()),
    }
}

fn cmd_check(bundle_path: &Path, vk: Option<&Path>) -> Result<u8> {
    let bundle = ProofBundle::load(bundle_path)
        .with_context(|| format!("failed to load bundle {}", bundle_path.display()))?;
    let verifier = select_verifier(vk)?;

    let ok = verifier
        .verify(&bundle.proof, &bundle.public_signals)
        .context("proof could not be evaluated")?;
    if ok {
        println!(
            "OK: proof verified by {} verifier ({} public input(s))",
            verifier.name(),
            bundle.public_signals.len()
        );
        Ok(0)
    } else {
        println!("REJECTED: proof did not verify under the {} verifier", verifier.name());
        Ok(1)
    }
}

#[cfg(feature = "groth16")]
fn select_verifier(vk: Option<&Path>) -> Result<Arc<dyn ProofVerifier>> {
    match vk {
        Some(path) => {
            let verifier = custody_zkp::Groth16Verifier::load(path)
                .with_context(|| format!("failed to load verifying key {}", path.display()))?;
            tracing::debug!(n_public = verifier.n_public(), "verifying key loaded");
            Ok(Arc::new(verifier))
        }
        None => Ok(Arc::new(MockVerifier)),
    }
}

#[cfg(not(feature = "groth16"))]
fn select_verifier(vk: Option<&Path>) -> Result<Arc<dyn ProofVerifier>> {
    match vk {
        Some(_) => anyhow::bail!("--vk needs a custody build with the `groth16` feature"),
        None => Ok(Arc::new(MockVerifier)),
    }
}

fn cmd_mock(inputs: &[String], out: Option<&Path>) -> Result<u8> {
    let public_signals = inputs
        .iter()
        .map(|s| FieldElement::parse(s).with_context(|| format!("invalid public input {s:?}")))
        .collect::<Result<Vec<_>>>()?;
    let bundle = ProofBundle {
        proof: MockVerifier::prove(&public_signals),
        public_signals,
    };
    let json = serde_json::to_string_pretty(&bundle).context("failed to serialize bundle")?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("OK: wrote mock bundle to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(0)
}
