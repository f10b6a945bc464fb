//! # Upload and Evidence Subcommands
//!
//! `upload` sends a file to the content store. `submit` appends a record
//! to the evidence ledger, optionally uploading the file first and
//! optionally gated on a proof bundle. `count` and `get` read a
//! submitter's records back.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use custody_client::{CustodyClient, SubmitRequest, SubmitWithProofRequest};
use custody_core::{Address, ContentHash};
use custody_ledger::AppendEvent;
use custody_zkp::ProofBundle;

/// Arguments for `custody upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `custody submit`.
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("content").required(true).args(["hash", "file"])))]
pub struct SubmitArgs {
    /// Submitting account (`0x` + 40 hex).
    #[arg(long, env = "CUSTODY_SUBMITTER")]
    pub submitter: String,
    /// Content hash to record (`0x` + 64 hex).
    #[arg(long)]
    pub hash: Option<String>,
    /// File whose hash to record.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Upload `--file` first and record its download URL.
    #[arg(long, requires = "file")]
    pub upload: bool,
    /// Inline metadata text or a metadata document hash.
    #[arg(long)]
    pub metadata: String,
    /// Download URL to record.
    #[arg(long, conflicts_with = "upload")]
    pub file_url: Option<String>,
    /// Note cached under a referenced `--metadata`.
    #[arg(long)]
    pub note: Option<String>,
    /// snarkjs proof bundle (`{ proof, publicSignals }`) gating the append.
    #[arg(long, value_name = "BUNDLE")]
    pub proof: Option<PathBuf>,
}

/// Arguments for `custody count`.
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Account to count records for.
    #[arg(long, env = "CUSTODY_SUBMITTER")]
    pub submitter: String,
}

/// Arguments for `custody get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Account whose record to read.
    #[arg(long, env = "CUSTODY_SUBMITTER")]
    pub submitter: String,
    /// Zero-based record index.
    #[arg(long)]
    pub index: u64,
}

/// Execute `custody upload`.
pub async fn run_upload(client: &CustodyClient, args: &UploadArgs) -> Result<u8> {
    let (name, bytes) = crate::read_input(&args.file)?;
    let size = bytes.len();
    let stored = client.upload(&name, bytes).await.context("upload failed")?;
    tracing::info!(size, filename = %stored.filename, "uploaded");
    println!("OK: stored {}", stored.filename);
    println!("  hash: {}", stored.content_hash_hex);
    println!("  url:  {}", stored.url);
    Ok(0)
}

/// Execute `custody submit`.
pub async fn run_submit(client: &CustodyClient, args: &SubmitArgs) -> Result<u8> {
    let submitter = parse_submitter(&args.submitter)?;

    let mut file_url = args.file_url.clone();
    let content_hash = match (&args.hash, &args.file) {
        (Some(hash), _) => {
            ContentHash::parse(hash).with_context(|| format!("invalid --hash {hash}"))?
        }
        (None, Some(path)) if args.upload => {
            let (name, bytes) = crate::read_input(path)?;
            let stored = client.upload(&name, bytes).await.context("upload failed")?;
            println!("OK: stored {}", stored.filename);
            file_url = Some(stored.url);
            stored.content_hash_hex
        }
        (None, Some(path)) => crate::hash::hash_file(path)?,
        (None, None) => bail!("one of --hash or --file is required"),
    };

    let record = SubmitRequest {
        submitter,
        content_hash,
        metadata_ref: args.metadata.clone(),
        file_url,
        note: args.note.clone(),
    };
    record
        .submission()
        .validate()
        .context("submission rejected before sending")?;

    let event = match &args.proof {
        None => client.submit(&record).await.context("submit failed")?,
        Some(path) => {
            let bundle = ProofBundle::load(path)
                .with_context(|| format!("failed to load proof bundle {}", path.display()))?;
            let request = SubmitWithProofRequest {
                record,
                proof: bundle.proof,
                public_inputs: bundle.public_signals,
            };
            client
                .submit_with_proof(&request)
                .await
                .context("proof-gated submit failed")?
        }
    };

    print_event(&event);
    Ok(0)
}

/// Execute `custody count`.
pub async fn run_count(client: &CustodyClient, args: &CountArgs) -> Result<u8> {
    let submitter = parse_submitter(&args.submitter)?;
    let count = client.count(&submitter).await.context("count failed")?;
    println!("{count}");
    Ok(0)
}

/// Execute `custody get`.
pub async fn run_get(client: &CustodyClient, args: &GetArgs) -> Result<u8> {
    let submitter = parse_submitter(&args.submitter)?;
    match client.get(&submitter, args.index).await.context("get failed")? {
        Some(event) => {
            print_event(&event);
            Ok(0)
        }
        None => {
            println!("NOT FOUND: {submitter} has no record {}", args.index);
            Ok(1)
        }
    }
}

fn parse_submitter(raw: &str) -> Result<Address> {
    Address::parse(raw).with_context(|| format!("invalid --submitter {raw}"))
}

fn print_event(event: &AppendEvent) {
    println!("OK: appended at {}", event.id());
    println!("  submitter: {}", event.submitter);
    println!("  hash:      {}", event.content_hash);
    println!("  metadata:  {}", event.metadata_ref);
    if let Some(url) = &event.file_url {
        println!("  url:       {url}");
    }
    println!("  time:      {}", event.timestamp);
}
