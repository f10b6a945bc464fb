//! # Chunked Backfill
//!
//! Hosts cap how many blocks one log query may span, so historical events
//! are fetched in fixed-size, inclusive chunks that cover the requested
//! range exactly: no gaps, no overlaps. Chunks are fetched one after
//! another and the cancellation flag is checked before each one.

use std::sync::atomic::{AtomicBool, Ordering};

use custody_ledger::{AppendEvent, ChainProvider};

use crate::error::FeedError;

/// Default number of blocks per range query.
pub const DEFAULT_CHUNK_SIZE: u64 = 5_000;

/// Split `from..=to` into inclusive chunks of at most `size` blocks.
///
/// Returns no chunks when `from > to`.
pub fn chunk_ranges(from: u64, to: u64, size: u64) -> Result<Vec<(u64, u64)>, FeedError> {
    if size == 0 {
        return Err(FeedError::InvalidChunkSize);
    }
    let mut chunks = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(size - 1).min(to);
        chunks.push((start, end));
        match end.checked_add(1) {
            Some(next) => start = next,
            None => break,
        }
    }
    Ok(chunks)
}

/// Fetch every event in `from..=to`, chunk by chunk.
pub async fn backfill<P: ChainProvider>(
    provider: &P,
    from: u64,
    to: u64,
    chunk_size: u64,
    cancelled: &AtomicBool,
) -> Result<Vec<AppendEvent>, FeedError> {
    let mut events = Vec::new();
    for (start, end) in chunk_ranges(from, to, chunk_size)? {
        if cancelled.load(Ordering::SeqCst) {
            return Err(FeedError::Cancelled);
        }
        let chunk = provider.events_in_range(start, end).await?;
        tracing::debug!(start, end, fetched = chunk.len(), "backfill chunk");
        events.extend(chunk);
    }
    Ok(events)
}
