//! # Evidence Ledger
//!
//! An append-only ledger of evidence records that behaves like an
//! auto-mining development chain: every accepted append mines one block,
//! the append event is the single log of that block, and the block number
//! with log index 0 is the event's position.
//!
//! ## Write Path
//!
//! 1. Validate the submission (no lock held).
//! 2. For gated appends, run the proof predicate (no lock held). Anything
//!    but a positive verdict ends the call with nothing recorded.
//! 3. Under the write lock: assign the next block, journal the event, and
//!    commit it to the global log and the submitter's list.
//! 4. Broadcast the event to subscribers.
//!
//! A journal failure in step 3 returns before anything is committed, so
//! the in-memory state never runs ahead of the journal.
//!
//! The lock is a `parking_lot::RwLock` and is never held across `.await`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use custody_core::{Address, FieldElement, Timestamp};
use custody_zkp::{Groth16Proof, ProofVerifier};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::error::{ChainError, LedgerError};
use crate::journal::Journal;
use crate::types::{AppendEvent, EventPosition, Submission};

/// Default per-query block range limit.
pub const DEFAULT_MAX_LOG_RANGE: u64 = 10_000;

/// Default capacity of the append broadcast channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Ledger construction options.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Widest block range a single `events_in_range` call may cover.
    pub max_log_range: u64,
    /// JSONL journal to replay and append to. `None` keeps state in memory.
    pub journal: Option<PathBuf>,
    /// Broadcast channel capacity.
    pub channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_log_range: DEFAULT_MAX_LOG_RANGE,
            journal: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    head: u64,
    // events[i] was mined in block i + 1.
    events: Vec<AppendEvent>,
    by_submitter: HashMap<Address, Vec<usize>>,
}

impl LedgerState {
    fn commit(&mut self, event: AppendEvent) {
        self.head = event.position.block_number;
        self.by_submitter
            .entry(event.submitter)
            .or_default()
            .push(self.events.len());
        self.events.push(event);
    }
}

/// The evidence ledger.
pub struct EvidenceLedger {
    state: RwLock<LedgerState>,
    journal: Option<Mutex<Journal>>,
    events_tx: broadcast::Sender<AppendEvent>,
    verifier: Arc<dyn ProofVerifier>,
    max_log_range: u64,
}

impl std::fmt::Debug for EvidenceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceLedger")
            .field("head", &self.head())
            .field("verifier", &self.verifier.name())
            .field("max_log_range", &self.max_log_range)
            .finish_non_exhaustive()
    }
}

impl EvidenceLedger {
    /// Open a ledger, replaying the journal if one is configured.
    pub fn open(config: LedgerConfig, verifier: Arc<dyn ProofVerifier>) -> Result<Self, LedgerError> {
        let mut state = LedgerState::default();
        let journal = match &config.journal {
            Some(path) => {
                let (journal, events) = Journal::open(path)?;
                for event in events {
                    state.commit(event);
                }
                Some(Mutex::new(journal))
            }
            None => None,
        };
        let (events_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Ok(Self {
            state: RwLock::new(state),
            journal,
            events_tx,
            verifier,
            max_log_range: config.max_log_range.max(1),
        })
    }

    /// An empty in-memory ledger.
    pub fn in_memory(verifier: Arc<dyn ProofVerifier>) -> Self {
        let (events_tx, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(LedgerState::default()),
            journal: None,
            events_tx,
            verifier,
            max_log_range: DEFAULT_MAX_LOG_RANGE,
        }
    }

    /// Name of the proof backend gating [`submit_with_proof`](Self::submit_with_proof).
    pub fn verifier_name(&self) -> &'static str {
        self.verifier.name()
    }

    /// Host limit on block range queries.
    pub fn max_log_range(&self) -> u64 {
        self.max_log_range
    }

    /// Record a submission.
    pub fn submit(
        &self,
        submitter: Address,
        submission: Submission,
    ) -> Result<AppendEvent, LedgerError> {
        submission.validate()?;
        self.append(submitter, submission)
    }

    /// Record a submission only if `proof` verifies against `public_inputs`.
    pub fn submit_with_proof(
        &self,
        submitter: Address,
        submission: Submission,
        proof: &Groth16Proof,
        public_inputs: &[FieldElement],
    ) -> Result<AppendEvent, LedgerError> {
        submission.validate()?;
        let verdict = self.verifier.verify(proof, public_inputs);
        match verdict {
            Ok(true) => self.append(submitter, submission),
            Ok(false) => {
                tracing::warn!(%submitter, verifier = self.verifier.name(), "proof rejected");
                Err(LedgerError::ProofRejected {
                    verifier: self.verifier.name(),
                })
            }
            Err(e) => {
                tracing::warn!(%submitter, error = %e, "proof could not be verified");
                Err(e.into())
            }
        }
    }

    fn append(&self, submitter: Address, submission: Submission) -> Result<AppendEvent, LedgerError> {
        let event = {
            let mut state = self.state.write();
            let event = AppendEvent {
                submitter,
                content_hash: submission.content_hash,
                metadata_ref: submission.metadata_ref,
                file_url: submission.file_url,
                timestamp: Timestamp::now(),
                position: EventPosition::new(state.head + 1, 0),
            };
            if let Some(journal) = &self.journal {
                journal.lock().append(&event)?;
            }
            state.commit(event.clone());
            event
        };

        tracing::info!(
            block = event.position.block_number,
            submitter = %event.submitter,
            content_hash = %event.content_hash,
            "evidence appended"
        );
        // No subscribers is not an error.
        let _ = self.events_tx.send(event.clone());
        Ok(event)
    }

    /// Number of records `submitter` has appended.
    pub fn count(&self, submitter: &Address) -> u64 {
        self.state
            .read()
            .by_submitter
            .get(submitter)
            .map_or(0, |v| v.len() as u64)
    }

    /// The `index`-th record of `submitter`, in append order.
    pub fn get(&self, submitter: &Address, index: u64) -> Result<AppendEvent, LedgerError> {
        let state = self.state.read();
        let list = state.by_submitter.get(submitter);
        let count = list.map_or(0, |v| v.len() as u64);
        list.and_then(|v| usize::try_from(index).ok().and_then(|i| v.get(i)))
            .map(|&slot| state.events[slot].clone())
            .ok_or(LedgerError::IndexOutOfRange {
                submitter: *submitter,
                index,
                count,
            })
    }

    /// Latest mined block; `0` before the first append.
    pub fn head(&self) -> u64 {
        self.state.read().head
    }

    /// Events mined in blocks `from..=to`, in chain order.
    pub fn events_in_range(&self, from: u64, to: u64) -> Result<Vec<AppendEvent>, ChainError> {
        if from > to {
            return Err(ChainError::InvalidRange { from, to });
        }
        if to - from >= self.max_log_range {
            return Err(ChainError::RangeTooLarge {
                from,
                to,
                limit: self.max_log_range,
            });
        }
        let state = self.state.read();
        let start = state
            .events
            .partition_point(|e| e.position.block_number < from);
        let end = state
            .events
            .partition_point(|e| e.position.block_number <= to);
        Ok(state.events[start..end].to_vec())
    }

    /// Receive every event appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AppendEvent> {
        self.events_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_core::ContentHash;
    use custody_zkp::MockVerifier;

    fn ledger() -> EvidenceLedger {
        EvidenceLedger::in_memory(Arc::new(MockVerifier))
    }

    fn alice() -> Address {
        Address::from_bytes([0xaa; 20])
    }

    fn bob() -> Address {
        Address::from_bytes([0xbb; 20])
    }

    fn submission(tag: &str) -> Submission {
        Submission {
            content_hash: ContentHash::of(tag.as_bytes()),
            metadata_ref: format!("note for {tag}"),
            file_url: Some(format!("http://localhost:8080/files/{tag}")),
        }
    }

    #[test]
    fn each_append_mines_one_block() {
        let ledger = ledger();
        assert_eq!(ledger.head(), 0);
        let first = ledger.submit(alice(), submission("a")).unwrap();
        let second = ledger.submit(bob(), submission("b")).unwrap();
        assert_eq!(first.position, EventPosition::new(1, 0));
        assert_eq!(second.position, EventPosition::new(2, 0));
        assert_eq!(ledger.head(), 2);
        assert!(!first.timestamp.is_unknown());
    }

    #[test]
    fn count_and_get_are_per_submitter() {
        let ledger = ledger();
        ledger.submit(alice(), submission("a1")).unwrap();
        ledger.submit(bob(), submission("b1")).unwrap();
        ledger.submit(alice(), submission("a2")).unwrap();

        assert_eq!(ledger.count(&alice()), 2);
        assert_eq!(ledger.count(&bob()), 1);
        assert_eq!(ledger.count(&Address::from_bytes([0; 20])), 0);
        assert_eq!(
            ledger.get(&alice(), 1).unwrap().content_hash,
            ContentHash::of(b"a2")
        );
        assert!(matches!(
            ledger.get(&bob(), 1),
            Err(LedgerError::IndexOutOfRange { count: 1, .. })
        ));
    }

    #[test]
    fn invalid_submission_leaves_no_trace() {
        let ledger = ledger();
        let mut bad = submission("x");
        bad.metadata_ref = String::new();
        assert!(matches!(
            ledger.submit(alice(), bad),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.head(), 0);
        assert_eq!(ledger.count(&alice()), 0);
    }

    #[test]
    fn valid_proof_is_accepted() {
        let ledger = ledger();
        let inputs = vec![FieldElement::from_u128(7)];
        let proof = MockVerifier::prove(&inputs);
        let event = ledger
            .submit_with_proof(alice(), submission("p"), &proof, &inputs)
            .unwrap();
        assert_eq!(event.position.block_number, 1);
    }

    #[test]
    fn rejected_proof_changes_nothing() {
        let ledger = ledger();
        let mut rx = ledger.subscribe();
        let proof = MockVerifier::prove(&[FieldElement::from_u128(7)]);
        let err = ledger
            .submit_with_proof(alice(), submission("p"), &proof, &[FieldElement::from_u128(8)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProofRejected { verifier: "mock" }));
        assert_eq!(ledger.count(&alice()), 0);
        assert_eq!(ledger.head(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_proof_is_rejected() {
        let ledger = ledger();
        let mut proof = MockVerifier::prove(&[]);
        proof.pi_a[0] = "not-a-number".into();
        assert!(matches!(
            ledger.submit_with_proof(alice(), submission("p"), &proof, &[]),
            Err(LedgerError::MalformedProof(_))
        ));
        assert_eq!(ledger.head(), 0);
    }

    #[test]
    fn range_queries_are_inclusive() {
        let ledger = ledger();
        for i in 0..5 {
            ledger.submit(alice(), submission(&format!("e{i}"))).unwrap();
        }
        let events = ledger.events_in_range(2, 4).unwrap();
        let blocks: Vec<u64> = events.iter().map(|e| e.position.block_number).collect();
        assert_eq!(blocks, vec![2, 3, 4]);
        assert_eq!(ledger.events_in_range(0, 0).unwrap().len(), 0);
        assert_eq!(ledger.events_in_range(5, 100).unwrap().len(), 1);
    }

    #[test]
    fn range_limits_are_enforced() {
        let ledger = EvidenceLedger::open(
            LedgerConfig {
                max_log_range: 10,
                ..LedgerConfig::default()
            },
            Arc::new(MockVerifier),
        )
        .unwrap();
        assert!(ledger.events_in_range(1, 10).is_ok());
        assert_eq!(
            ledger.events_in_range(1, 11),
            Err(ChainError::RangeTooLarge {
                from: 1,
                to: 11,
                limit: 10
            })
        );
        assert_eq!(
            ledger.events_in_range(5, 4),
            Err(ChainError::InvalidRange { from: 5, to: 4 })
        );
    }

    #[test]
    fn subscribers_see_appends() {
        let ledger = ledger();
        let mut rx = ledger.subscribe();
        let event = ledger.submit(alice(), submission("live")).unwrap();
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn journal_replay_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig {
            journal: Some(dir.path().join("ledger.jsonl")),
            ..LedgerConfig::default()
        };
        {
            let ledger = EvidenceLedger::open(config.clone(), Arc::new(MockVerifier)).unwrap();
            ledger.submit(alice(), submission("a")).unwrap();
            ledger.submit(bob(), submission("b")).unwrap();
            ledger.submit(alice(), submission("c")).unwrap();
        }
        let reopened = EvidenceLedger::open(config, Arc::new(MockVerifier)).unwrap();
        assert_eq!(reopened.head(), 3);
        assert_eq!(reopened.count(&alice()), 2);
        assert_eq!(
            reopened.get(&alice(), 1).unwrap().content_hash,
            ContentHash::of(b"c")
        );
        let next = reopened.submit(bob(), submission("d")).unwrap();
        assert_eq!(next.position.block_number, 4);
    }
}
