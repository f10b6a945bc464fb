//! # Verify and Watch Subcommands
//!
//! Both build a reconciled feed locally over the API's chain surface
//! (`/v1/chain/*`): backfill in chunks, then follow new blocks by polling.
//! `verify` answers one lookup and exits; `watch` keeps printing new
//! records until interrupted.
//!
//! `verify --server` skips the local feed and asks the server's own view.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use custody_client::CustodyClient;
use custody_core::{QueryMode, VerificationQuery};
use custody_feed::{EvidenceRecord, FeedConfig, FeedView, InMemoryCache, LoadState};
use custody_ledger::EventId;

/// Arguments for `custody verify`.
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("query").required(true).args(["file", "hash", "commitment"])))]
pub struct VerifyArgs {
    /// File to hash and look up.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Content hash to look up (`0x` + 64 hex).
    #[arg(long)]
    pub hash: Option<String>,
    /// Decimal commitment to look up.
    #[arg(long)]
    pub commitment: Option<String>,
    /// Ask the server's feed instead of reconciling locally.
    #[arg(long)]
    pub server: bool,
    /// First block to backfill from.
    #[arg(long, default_value_t = 0)]
    pub start_block: u64,
}

/// Arguments for `custody watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Existing records to print before following.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
    /// First block to backfill from.
    #[arg(long, default_value_t = 0)]
    pub start_block: u64,
}

/// Build a query from exactly one of the three inputs, validating it
/// before anything is sent.
fn build_query(args: &VerifyArgs) -> Result<VerificationQuery> {
    if let Some(path) = &args.file {
        return Ok(VerificationQuery::Hash(crate::hash::hash_file(path)?));
    }
    if let Some(hash) = &args.hash {
        return custody_feed::parse_typed(hash, QueryMode::Digest)
            .with_context(|| format!("invalid --hash {hash}"));
    }
    if let Some(commitment) = &args.commitment {
        return custody_feed::parse_typed(commitment, QueryMode::Commitment)
            .with_context(|| format!("invalid --commitment {commitment}"));
    }
    anyhow::bail!("one of --file, --hash or --commitment is required")
}

fn open_feed(client: &CustodyClient, start_block: u64) -> FeedView<CustodyClient> {
    FeedView::new(
        Arc::new(client.clone()),
        Arc::new(InMemoryCache::new()),
        FeedConfig {
            chunk_size: client.chunk_size(),
            start_block,
        },
    )
}

/// Execute `custody verify`.
pub async fn run_verify(client: &CustodyClient, args: &VerifyArgs) -> Result<u8> {
    let query = build_query(args)?;

    let records = if args.server {
        let response = match (&args.file, &args.commitment) {
            (Some(path), _) => {
                let (name, bytes) = crate::read_input(path)?;
                client.verify_file(&name, bytes).await
            }
            (None, Some(commitment)) => client.verify(commitment, QueryMode::Commitment).await,
            (None, None) => {
                let hash = args.hash.as_deref().unwrap_or_default();
                client.verify(hash, QueryMode::Digest).await
            }
        }
        .context("verification request failed")?;
        response.records
    } else {
        let view = open_feed(client, args.start_block);
        let loaded = view.load().await.context("failed to load the evidence feed")?;
        tracing::info!(records = loaded, "feed loaded");
        let records = view.verify(&query);
        view.teardown();
        records
    };

    if records.is_empty() {
        println!("NOT FOUND: no record for {}", target(&query));
        return Ok(1);
    }
    println!("OK: {} record(s) for {}", records.len(), target(&query));
    for record in &records {
        println!("  {}", crate::format_record(record));
    }
    Ok(0)
}

fn target(query: &VerificationQuery) -> String {
    match query {
        VerificationQuery::Hash(hash) => hash.to_hex(),
        VerificationQuery::Commitment(field) => format!("commitment {field}"),
    }
}

/// Execute `custody watch`. Runs until Ctrl-C or a feed error.
pub async fn run_watch(client: &CustodyClient, args: &WatchArgs) -> Result<u8> {
    let view = open_feed(client, args.start_block);
    let mut len_rx = view.watch_len();
    view.load().await.context("failed to load the evidence feed")?;

    let mut seen: HashSet<EventId> = HashSet::new();
    let existing = view.records();
    seen.extend(existing.iter().map(|r| r.id));
    println!("{} record(s); newest first:", existing.len());
    for record in existing.iter().take(args.limit) {
        println!("  {}", crate::format_record(record));
    }
    println!("watching for new records (Ctrl-C to stop)");

    loop {
        tokio::select! {
            changed = len_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let LoadState::Error(e) = view.state() {
                    anyhow::bail!("feed failed: {e}");
                }
                for record in unseen(&view.records(), &mut seen) {
                    println!("+ {}", crate::format_record(&record));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }

    view.teardown();
    Ok(0)
}

/// Records not printed yet, oldest first.
fn unseen(records: &[EvidenceRecord], seen: &mut HashSet<EventId>) -> Vec<EvidenceRecord> {
    let mut fresh: Vec<EvidenceRecord> = records
        .iter()
        .filter(|r| seen.insert(r.id))
        .cloned()
        .collect();
    fresh.reverse();
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_core::{Address, ContentHash, Timestamp};
    use custody_ledger::EventPosition;

    fn args() -> VerifyArgs {
        VerifyArgs {
            file: None,
            hash: None,
            commitment: None,
            server: false,
            start_block: 0,
        }
    }

    fn record(block: u64) -> EvidenceRecord {
        EvidenceRecord {
            id: EventPosition::new(block, 0).id(),
            submitter: Address::from_bytes([0x22; 20]),
            content_hash: ContentHash::of(&block.to_be_bytes()),
            metadata_ref: "m".into(),
            file_url: None,
            note: Some("m".into()),
            timestamp: Timestamp::from_secs(block),
        }
    }

    #[test]
    fn garbage_hash_is_rejected_locally() {
        let bad = VerifyArgs {
            hash: Some("not-hex-not-decimal".into()),
            ..args()
        };
        assert!(build_query(&bad).is_err());
    }

    #[test]
    fn commitment_query_uses_commitment_mode() {
        let q = VerifyArgs {
            commitment: Some("42".into()),
            ..args()
        };
        assert_eq!(build_query(&q).unwrap().mode(), QueryMode::Commitment);
    }

    #[test]
    fn file_query_matches_typed_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();
        let by_file = build_query(&VerifyArgs {
            file: Some(path),
            ..args()
        })
        .unwrap();
        let by_hash = build_query(&VerifyArgs {
            hash: Some(ContentHash::of(b"hello").to_hex()),
            ..args()
        })
        .unwrap();
        assert_eq!(by_file, by_hash);
    }

    #[test]
    fn unseen_returns_new_records_oldest_first_once() {
        let mut seen = HashSet::new();
        seen.insert(record(1).id);
        let feed = vec![record(3), record(2), record(1)];
        let fresh = unseen(&feed, &mut seen);
        let blocks: Vec<u64> = fresh.iter().map(|r| r.id.position().block_number).collect();
        assert_eq!(blocks, vec![2, 3]);
        assert!(unseen(&feed, &mut seen).is_empty());
    }
}
