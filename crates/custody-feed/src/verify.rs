//! # Verification Lookups
//!
//! "Is this file on the ledger?" is answered by exact comparison of the
//! 32 query bytes against each record's content hash. A hash recomputed
//! from a file and the same hash typed by hand produce the same query and
//! therefore the same answer.

use custody_core::{QueryMode, VerificationQuery};

use crate::error::FeedError;
use crate::record::EvidenceRecord;

/// Records whose content hash satisfies `query`, in feed order.
pub fn find_matches<'a>(
    records: impl IntoIterator<Item = &'a EvidenceRecord>,
    query: &VerificationQuery,
) -> Vec<EvidenceRecord> {
    let target = query.target_bytes();
    records
        .into_iter()
        .filter(|r| r.content_hash.as_bytes() == &target)
        .cloned()
        .collect()
}

/// Validate typed input under `mode`. Fails before any lookup runs.
pub fn parse_typed(input: &str, mode: QueryMode) -> Result<VerificationQuery, FeedError> {
    Ok(VerificationQuery::parse(input, mode)?)
}
