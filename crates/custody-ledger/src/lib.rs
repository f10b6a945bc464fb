//! # custody-ledger: Append-Only Evidence Ledger
//!
//! Stores (content hash, metadata reference, optional URL, submitter,
//! timestamp) records per submitter and emits an [`AppendEvent`] for each
//! one. Appends may be gated by a proof predicate; a rejected proof leaves
//! no record, no event, and no block.
//!
//! Reads come in two shapes: per-submitter `count`/`get`, and the
//! [`ChainProvider`] surface (`head`, bounded `events_in_range`,
//! `subscribe`) that reconciliation views consume.

pub mod error;
pub mod journal;
pub mod ledger;
pub mod provider;
pub mod types;

pub use error::{ChainError, LedgerError};
pub use journal::Journal;
pub use ledger::{EvidenceLedger, LedgerConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_LOG_RANGE};
pub use provider::ChainProvider;
pub use types::{AppendEvent, EventId, EventPosition, Submission};
