//! # custody-feed: Reconciliation and Verification View
//!
//! Consumes the ledger's append events (historical backfill plus a live
//! subscription), normalises them into [`EvidenceRecord`]s, de-duplicates
//! by event id, sorts newest first, and answers verification lookups.
//!
//! Backfill and live delivery share one merge step ([`Feed::merge`]), so
//! re-delivered events never produce duplicate rows.

pub mod backfill;
pub mod cache;
pub mod error;
pub mod merge;
pub mod record;
pub mod verify;
pub mod view;

pub use backfill::{backfill, chunk_ranges, DEFAULT_CHUNK_SIZE};
pub use cache::{cache_key, InMemoryCache, JsonFileCache, MetadataCache, CACHE_KEY_PREFIX};
pub use error::FeedError;
pub use merge::Feed;
pub use record::EvidenceRecord;
pub use verify::{find_matches, parse_typed};
pub use view::{FeedConfig, FeedView, LoadState};
