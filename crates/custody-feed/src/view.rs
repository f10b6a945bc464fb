//! # Feed View
//!
//! Builds and maintains the reconciled feed for one chain provider.
//!
//! ## Load Cycle
//!
//! ```text
//! idle ──load()──▶ loading ──ok──▶ idle   (live merges continue here)
//!                          └─err─▶ error  (no retry; call load() again)
//! ```
//!
//! A cycle queries the head, backfills `start_block..=head` in chunks,
//! opens the live subscription, then fetches `head+1..=new_head` once so
//! an append that landed between the head query and the subscription is
//! not lost. Overlap with the live stream is absorbed by the merge.
//!
//! If the live receiver lags behind the provider's channel, the missed
//! events are refetched from the highest block merged so far up to the
//! current head. When that refetch fails the view moves to `error` and the
//! live task stops; the caller reloads.
//!
//! Each cycle owns a cancellation flag. [`FeedView::teardown`] (also run
//! on drop) sets it, aborts the live task and returns a `loading` view to
//! `idle`; a cycle whose flag is set never touches the view's state again.
//! Calling [`FeedView::load`] again tears down the current cycle and starts
//! from an empty feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use custody_core::{QueryMode, VerificationQuery};
use custody_ledger::{AppendEvent, ChainProvider};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::backfill::{backfill, DEFAULT_CHUNK_SIZE};
use crate::cache::MetadataCache;
use crate::error::FeedError;
use crate::merge::Feed;
use crate::record::EvidenceRecord;
use crate::verify::{find_matches, parse_typed};

/// Feed view options.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Blocks per backfill query.
    pub chunk_size: u64,
    /// First block to backfill from.
    pub start_block: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            start_block: 0,
        }
    }
}

/// Where the view is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    /// Not loading. Live events merge in this state.
    Idle,
    /// A load cycle is running.
    Loading,
    /// The last load failed.
    Error(String),
}

#[derive(Debug)]
struct Shared {
    state: LoadState,
    feed: Feed,
}

struct Cycle {
    cancelled: Arc<AtomicBool>,
    live: Option<JoinHandle<()>>,
}

/// Reconciled, live-updating view of a chain's evidence records.
pub struct FeedView<P: ChainProvider> {
    provider: Arc<P>,
    cache: Arc<dyn MetadataCache>,
    config: FeedConfig,
    shared: Arc<Mutex<Shared>>,
    len_tx: Arc<watch::Sender<usize>>,
    cycle: Mutex<Option<Cycle>>,
}

impl<P: ChainProvider> FeedView<P> {
    /// Create an idle, empty view.
    pub fn new(provider: Arc<P>, cache: Arc<dyn MetadataCache>, config: FeedConfig) -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            provider,
            cache,
            config,
            shared: Arc::new(Mutex::new(Shared {
                state: LoadState::Idle,
                feed: Feed::new(),
            })),
            len_tx: Arc::new(len_tx),
            cycle: Mutex::new(None),
        }
    }

    /// Run a fresh load cycle. Returns the feed length once backfill is
    /// merged and the live subscription is running.
    pub async fn load(&self) -> Result<usize, FeedError> {
        let cancelled = self.begin_cycle();
        let fetched = self.fetch(&cancelled).await;

        let (events, rx, synced_to) = {
            let mut shared = self.shared.lock();
            if cancelled.load(Ordering::SeqCst) {
                return Err(FeedError::Cancelled);
            }
            match fetched {
                Ok(ok) => ok,
                Err(e) => {
                    tracing::warn!(error = %e, "feed load failed");
                    shared.state = LoadState::Error(e.to_string());
                    return Err(e);
                }
            }
        };

        let len = {
            let mut shared = self.shared.lock();
            if cancelled.load(Ordering::SeqCst) {
                return Err(FeedError::Cancelled);
            }
            shared.feed.merge(
                events
                    .iter()
                    .map(|e| EvidenceRecord::from_event(e, self.cache.as_ref())),
            );
            shared.state = LoadState::Idle;
            shared.feed.len()
        };
        self.len_tx.send_replace(len);
        tracing::info!(records = len, "feed loaded");

        let live = LiveTask {
            provider: Arc::clone(&self.provider),
            shared: Arc::clone(&self.shared),
            cache: Arc::clone(&self.cache),
            len_tx: Arc::clone(&self.len_tx),
            cancelled: Arc::clone(&cancelled),
            chunk_size: self.config.chunk_size,
            start_block: self.config.start_block,
        };
        let handle = tokio::spawn(live.run(rx, synced_to));
        let mut cycle = self.cycle.lock();
        match cycle.as_mut() {
            Some(current) if Arc::ptr_eq(&current.cancelled, &cancelled) => {
                current.live = Some(handle);
            }
            _ => handle.abort(),
        }
        Ok(len)
    }

    fn begin_cycle(&self) -> Arc<AtomicBool> {
        self.teardown();
        let cancelled = Arc::new(AtomicBool::new(false));
        *self.cycle.lock() = Some(Cycle {
            cancelled: Arc::clone(&cancelled),
            live: None,
        });
        {
            let mut shared = self.shared.lock();
            shared.state = LoadState::Loading;
            shared.feed.clear();
        }
        self.len_tx.send_replace(0);
        cancelled
    }

    /// Backfill, subscribe, catch up. Also returns the head the events
    /// cover.
    async fn fetch(
        &self,
        cancelled: &AtomicBool,
    ) -> Result<(Vec<AppendEvent>, broadcast::Receiver<AppendEvent>, u64), FeedError> {
        let chunk = self.config.chunk_size;
        let start = self.config.start_block;
        let provider = self.provider.as_ref();

        let head = provider.head().await?;
        let mut events = backfill(provider, start, head, chunk, cancelled).await?;
        if cancelled.load(Ordering::SeqCst) {
            return Err(FeedError::Cancelled);
        }

        let rx = provider.subscribe().await?;
        let latest = provider.head().await?;
        if latest > head {
            let from = head.saturating_add(1).max(start);
            events.extend(backfill(provider, from, latest, chunk, cancelled).await?);
        }
        Ok((events, rx, latest.max(head)))
    }

    /// Cancel the current cycle and detach its live subscription. A load
    /// cut short here leaves the view `idle`.
    pub fn teardown(&self) {
        if let Some(cycle) = self.cycle.lock().take() {
            cycle.cancelled.store(true, Ordering::SeqCst);
            if let Some(live) = cycle.live {
                live.abort();
            }
            let mut shared = self.shared.lock();
            if shared.state == LoadState::Loading {
                shared.state = LoadState::Idle;
            }
        }
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.shared.lock().state.clone()
    }

    /// Whether a live subscription is attached.
    pub fn is_live(&self) -> bool {
        self.cycle
            .lock()
            .as_ref()
            .and_then(|c| c.live.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    /// All records, newest first.
    pub fn records(&self) -> Vec<EvidenceRecord> {
        self.shared.lock().feed.records().to_vec()
    }

    /// At most `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<EvidenceRecord> {
        self.shared
            .lock()
            .feed
            .records()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.shared.lock().feed.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Watch the feed length change.
    pub fn watch_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }

    /// Records matching a validated query.
    pub fn verify(&self, query: &VerificationQuery) -> Vec<EvidenceRecord> {
        find_matches(self.shared.lock().feed.records(), query)
    }

    /// Records whose content hash equals the hash of `bytes`.
    pub fn verify_bytes(&self, bytes: &[u8]) -> Vec<EvidenceRecord> {
        self.verify(&VerificationQuery::for_bytes(bytes))
    }

    /// Validate typed input, then look it up.
    pub fn verify_typed(
        &self,
        input: &str,
        mode: QueryMode,
    ) -> Result<Vec<EvidenceRecord>, FeedError> {
        let query = parse_typed(input, mode)?;
        Ok(self.verify(&query))
    }
}

impl<P: ChainProvider> Drop for FeedView<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct LiveTask<P: ChainProvider> {
    provider: Arc<P>,
    shared: Arc<Mutex<Shared>>,
    cache: Arc<dyn MetadataCache>,
    len_tx: Arc<watch::Sender<usize>>,
    cancelled: Arc<AtomicBool>,
    chunk_size: u64,
    start_block: u64,
}

impl<P: ChainProvider> LiveTask<P> {
    /// Merge live events until the subscription closes or the cycle is
    /// cancelled. `synced_to` is the highest block already merged.
    async fn run(self, mut rx: broadcast::Receiver<AppendEvent>, mut synced_to: u64) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    synced_to = synced_to.max(event.position.block_number);
                    let record = EvidenceRecord::from_event(&event, self.cache.as_ref());
                    if !self.merge([record]) {
                        break;
                    }
                    tracing::debug!(id = %event.id(), "live event merged");
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        missed,
                        from = synced_to,
                        "live subscription lagged; refetching"
                    );
                    match self.catch_up(synced_to).await {
                        Ok(head) => synced_to = synced_to.max(head),
                        Err(FeedError::Cancelled) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "lag recovery failed");
                            self.fail(&e);
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("live subscription closed");
                    break;
                }
            }
        }
    }

    /// Fetch and merge `synced_to+1..=head`. Returns the head fetched to.
    async fn catch_up(&self, synced_to: u64) -> Result<u64, FeedError> {
        let provider = self.provider.as_ref();
        let head = provider.head().await?;
        let from = synced_to.saturating_add(1).max(self.start_block);
        if from <= head {
            let events = backfill(provider, from, head, self.chunk_size, &self.cancelled).await?;
            let records = events
                .iter()
                .map(|e| EvidenceRecord::from_event(e, self.cache.as_ref()));
            if !self.merge(records) {
                return Err(FeedError::Cancelled);
            }
        }
        Ok(head)
    }

    fn fail(&self, err: &FeedError) {
        let mut shared = self.shared.lock();
        if !self.cancelled.load(Ordering::SeqCst) {
            shared.state = LoadState::Error(err.to_string());
        }
    }

    /// Merge under the lock unless the cycle is cancelled. Returns false
    /// once cancelled.
    fn merge(&self, records: impl IntoIterator<Item = EvidenceRecord>) -> bool {
        let len = {
            let mut shared = self.shared.lock();
            if self.cancelled.load(Ordering::SeqCst) {
                return false;
            }
            if shared.feed.merge(records) == 0 {
                return true;
            }
            shared.feed.len()
        };
        self.len_tx.send_replace(len);
        true
    }
}
