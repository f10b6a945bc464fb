//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Cloning is cheap: every component sits behind an
//! `Arc`.
//!
//! The server hosts its own reconciliation view over the in-process ledger
//! so that `/v1/feed` and `/v1/verify` answer from the same merged,
//! de-duplicated feed a remote client would build.

use std::sync::Arc;

use custody_feed::{FeedConfig, FeedView, InMemoryCache, JsonFileCache, MetadataCache};
use custody_ledger::{EvidenceLedger, LedgerConfig, DEFAULT_CHANNEL_CAPACITY};
use custody_store::ContentStore;
use custody_zkp::{MockVerifier, ProofVerifier};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError, VerifierKind};

/// Errors assembling the application state.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Content store directory could not be opened.
    #[error("content store: {0}")]
    Store(#[from] custody_store::StoreError),
    /// Ledger journal could not be replayed.
    #[error("ledger: {0}")]
    Ledger(#[from] custody_ledger::LedgerError),
    /// Metadata cache file could not be read.
    #[error("metadata cache: {0}")]
    Cache(#[from] custody_feed::FeedError),
    /// Verifying key could not be loaded.
    #[error("verifier: {0}")]
    Verifier(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<ContentStore>,
    pub ledger: Arc<EvidenceLedger>,
    pub cache: Arc<dyn MetadataCache>,
    pub feed: Arc<FeedView<EvidenceLedger>>,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .field("feed_records", &self.feed.len())
            .finish()
    }
}

impl AppState {
    /// Open the store, replay the ledger journal and build an idle feed.
    ///
    /// The feed is not loaded here; call [`AppState::start`] once a Tokio
    /// runtime is available.
    pub fn build(config: AppConfig) -> Result<Self, BootstrapError> {
        let verifier = build_verifier(&config)?;
        let store = ContentStore::open(&config.storage_dir, config.max_upload_bytes)?;
        let ledger = EvidenceLedger::open(
            LedgerConfig {
                max_log_range: config.max_log_range,
                journal: config.ledger_journal.clone(),
                channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            },
            verifier,
        )?;
        let cache: Arc<dyn MetadataCache> = match &config.metadata_cache {
            Some(path) => Arc::new(JsonFileCache::open(path)?),
            None => Arc::new(InMemoryCache::new()),
        };

        let ledger = Arc::new(ledger);
        let feed = FeedView::new(
            Arc::clone(&ledger),
            Arc::clone(&cache),
            FeedConfig {
                chunk_size: config.feed_chunk,
                start_block: 0,
            },
        );

        tracing::info!(
            storage_dir = %config.storage_dir.display(),
            head = ledger.head(),
            verifier = ledger.verifier_name(),
            "application state built"
        );

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            ledger,
            cache,
            feed: Arc::new(feed),
            metrics: None,
        })
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Load the server-side feed and start following the ledger.
    pub async fn start(&self) -> Result<usize, custody_feed::FeedError> {
        self.feed.load().await
    }
}

fn build_verifier(config: &AppConfig) -> Result<Arc<dyn ProofVerifier>, BootstrapError> {
    match config.verifier {
        VerifierKind::Mock => Ok(Arc::new(MockVerifier)),
        VerifierKind::Groth16 => groth16_verifier(config),
    }
}

#[cfg(feature = "groth16")]
fn groth16_verifier(config: &AppConfig) -> Result<Arc<dyn ProofVerifier>, BootstrapError> {
    let path = config
        .verifying_key
        .as_ref()
        .ok_or(ConfigError::Missing("CUSTODY_VERIFYING_KEY"))?;
    let verifier = custody_zkp::Groth16Verifier::load(path)
        .map_err(|e| BootstrapError::Verifier(format!("{}: {e}", path.display())))?;
    tracing::info!(n_public = verifier.n_public(), "groth16 verifying key loaded");
    Ok(Arc::new(verifier))
}

#[cfg(not(feature = "groth16"))]
fn groth16_verifier(_config: &AppConfig) -> Result<Arc<dyn ProofVerifier>, BootstrapError> {
    Err(BootstrapError::Verifier(
        "groth16 verifier requested but custody-api was built without the `groth16` feature"
            .to_string(),
    ))
}
