//! # Hash Subcommand
//!
//! Computes content hashes locally, without contacting the API. Output
//! mirrors `sha256sum`: one line per file with the hash, the storage name
//! the content store would assign, and the path.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use custody_core::{ContentHash, Keccak256Accumulator};
use custody_store::StorageName;

const READ_BUF: usize = 64 * 1024;

/// Arguments for the `custody hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Files to hash.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the hash subcommand.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    for path in &args.files {
        let hash = hash_file(path)?;
        let original = path.file_name().and_then(|n| n.to_str());
        let name = StorageName::new(hash, original);
        println!("{hash}  {name}  {}", path.display());
    }
    Ok(0)
}

/// Keccak-256 of a file, read in chunks.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut acc = Keccak256Accumulator::new();
    let mut buf = vec![0u8; READ_BUF];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        acc.update(&buf[..n]);
    }
    Ok(acc.finalize())
}
