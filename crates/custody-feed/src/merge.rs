//! # Feed Merge
//!
//! Backfilled and live records pass through the same merge step. Records
//! are keyed by their event id, so re-delivery of an event (overlapping
//! backfill and live, a catch-up fetch, a polling provider) is absorbed.
//!
//! After each merge the feed is stably sorted by timestamp, newest first.
//! Unknown timestamps (`0`) therefore sort after every dated record, and
//! records with equal timestamps keep the order they entered the feed in.
//! For undated records that feed position is the fallback ordering; block
//! numbers are not consulted.

use std::collections::HashSet;

use custody_ledger::EventId;

use crate::record::EvidenceRecord;

/// De-duplicated, timestamp-sorted evidence records.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    records: Vec<EvidenceRecord>,
    seen: HashSet<EventId>,
}

impl Feed {
    /// An empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `incoming`, returning how many records were new.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = EvidenceRecord>) -> usize {
        let before = self.records.len();
        for record in incoming {
            if self.seen.insert(record.id) {
                self.records.push(record);
            }
        }
        let added = self.records.len() - before;
        if added > 0 {
            // Stable: ties keep feed position.
            self.records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        added
    }

    /// Records in feed order.
    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record with this id is present.
    pub fn contains(&self, id: &EventId) -> bool {
        self.seen.contains(id)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_core::{Address, ContentHash, Timestamp};
    use custody_ledger::EventPosition;
    use proptest::prelude::*;

    fn record(block: u64, ts: u64) -> EvidenceRecord {
        EvidenceRecord {
            id: EventPosition::new(block, 0).id(),
            submitter: Address::from_bytes([1; 20]),
            content_hash: ContentHash::of(&block.to_be_bytes()),
            metadata_ref: "m".into(),
            file_url: None,
            note: None,
            timestamp: Timestamp::from_secs(ts),
        }
    }

    fn blocks(feed: &Feed) -> Vec<u64> {
        feed.records()
            .iter()
            .map(|r| r.id.position().block_number)
            .collect()
    }

    #[test]
    fn identical_positions_collapse() {
        let mut feed = Feed::new();
        assert_eq!(feed.merge([record(1, 10), record(1, 10)]), 1);
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn overlapping_redelivery_is_absorbed() {
        let mut feed = Feed::new();
        feed.merge((1..=5).map(|b| record(b, b * 10)));
        let added = feed.merge((3..=7).map(|b| record(b, b * 10)));
        assert_eq!(added, 2);
        assert_eq!(feed.len(), 7);
    }

    #[test]
    fn newest_first_with_unknown_last() {
        let mut feed = Feed::new();
        feed.merge([record(1, 0), record(2, 50), record(3, 0), record(4, 70)]);
        assert_eq!(blocks(&feed), vec![4, 2, 1, 3]);
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let mut feed = Feed::new();
        feed.merge([record(5, 0), record(2, 0)]);
        feed.merge([record(9, 0)]);
        assert_eq!(blocks(&feed), vec![5, 2, 9]);
    }

    #[test]
    fn undated_records_follow_feed_position_not_block_number() {
        let mut feed = Feed::new();
        feed.merge([record(8, 0), record(3, 0), record(6, 0)]);
        feed.merge([record(1, 20), record(7, 0)]);
        assert_eq!(blocks(&feed), vec![1, 8, 3, 6, 7]);
    }

    #[test]
    fn clear_forgets_ids() {
        let mut feed = Feed::new();
        feed.merge([record(1, 1)]);
        feed.clear();
        assert!(feed.is_empty());
        assert_eq!(feed.merge([record(1, 1)]), 1);
    }

    proptest! {
        #[test]
        fn merge_is_idempotent_and_sorted(
            events in proptest::collection::vec((1u64..50, 0u64..5), 0..80)
        ) {
            let mut feed = Feed::new();
            feed.merge(events.iter().map(|(b, t)| record(*b, *t)));
            let once = blocks(&feed);
            feed.merge(events.iter().map(|(b, t)| record(*b, *t)));
            prop_assert_eq!(blocks(&feed), once);

            let distinct: HashSet<u64> = events.iter().map(|(b, _)| *b).collect();
            prop_assert_eq!(feed.len(), distinct.len());
            prop_assert!(feed
                .records()
                .windows(2)
                .all(|w| w[0].timestamp >= w[1].timestamp));
        }
    }
}
