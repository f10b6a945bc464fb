//! # Chain Provider
//!
//! The read surface a reconciliation view needs from a chain: the current
//! head, a bounded historical range query, and a live subscription. The
//! in-process [`EvidenceLedger`] implements it directly; the HTTP client
//! implements it against a remote ledger.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::ChainError;
use crate::ledger::EvidenceLedger;
use crate::types::AppendEvent;

/// Read access to a stream of append events.
pub trait ChainProvider: Send + Sync + 'static {
    /// Latest block number.
    fn head(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// Append events mined in blocks `from..=to`.
    fn events_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> impl Future<Output = Result<Vec<AppendEvent>, ChainError>> + Send;

    /// Open a live subscription to events appended from now on.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<broadcast::Receiver<AppendEvent>, ChainError>> + Send;
}

impl ChainProvider for EvidenceLedger {
    async fn head(&self) -> Result<u64, ChainError> {
        Ok(EvidenceLedger::head(self))
    }

    async fn events_in_range(&self, from: u64, to: u64) -> Result<Vec<AppendEvent>, ChainError> {
        EvidenceLedger::events_in_range(self, from, to)
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<AppendEvent>, ChainError> {
        Ok(EvidenceLedger::subscribe(self))
    }
}

impl<P: ChainProvider> ChainProvider for Arc<P> {
    fn head(&self) -> impl Future<Output = Result<u64, ChainError>> + Send {
        P::head(self)
    }

    fn events_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> impl Future<Output = Result<Vec<AppendEvent>, ChainError>> + Send {
        P::events_in_range(self, from, to)
    }

    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<broadcast::Receiver<AppendEvent>, ChainError>> + Send {
        P::subscribe(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Submission;
    use custody_core::{Address, ContentHash};
    use custody_zkp::MockVerifier;

    async fn head_of<P: ChainProvider>(provider: &P) -> u64 {
        provider.head().await.unwrap()
    }

    #[tokio::test]
    async fn ledger_and_arc_serve_the_same_chain() {
        let ledger = Arc::new(EvidenceLedger::in_memory(Arc::new(MockVerifier)));
        ledger
            .submit(
                Address::from_bytes([1; 20]),
                Submission {
                    content_hash: ContentHash::of(b"x"),
                    metadata_ref: "m".into(),
                    file_url: None,
                },
            )
            .unwrap();
        assert_eq!(head_of(&ledger).await, 1);
        assert_eq!(head_of(ledger.as_ref()).await, 1);
        let events = ChainProvider::events_in_range(&ledger, 1, 1).await.unwrap();
        assert_eq!(events.len(), 1);
    }
}
