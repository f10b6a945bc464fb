//! # Evidence Records
//!
//! The normalised form of an append event as shown in the reconciled feed.
//! Metadata references are resolved against the local cache here; inline
//! metadata is carried through as the note.

use custody_core::{Address, ContentHash, MetadataRef, Timestamp};
use custody_ledger::{AppendEvent, EventId};
use serde::{Deserialize, Serialize};

use crate::cache::MetadataCache;

/// One row of the reconciled feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// `"<block>:<log>"`; unique across the feed.
    pub id: EventId,
    /// Account that submitted the record.
    pub submitter: Address,
    /// Keccak-256 of the file bytes.
    pub content_hash: ContentHash,
    /// Metadata text or reference as recorded.
    pub metadata_ref: String,
    /// Download location, from the event or the cache.
    pub file_url: Option<String>,
    /// Human note, from inline metadata or the cache.
    pub note: Option<String>,
    /// Seconds since epoch; `0` when unknown.
    pub timestamp: Timestamp,
}

impl EvidenceRecord {
    /// Normalise an append event, enriching it from `cache`.
    pub fn from_event(event: &AppendEvent, cache: &dyn MetadataCache) -> Self {
        let mut file_url = event.file_url.clone();
        let note = match MetadataRef::classify(&event.metadata_ref) {
            MetadataRef::Inline(text) => Some(text),
            MetadataRef::Reference(_) => {
                let cached = cache.get(&event.metadata_ref).unwrap_or_default();
                if file_url.is_none() {
                    file_url = cached.file_url;
                }
                cached.note
            }
        };
        Self {
            id: event.id(),
            submitter: event.submitter,
            content_hash: event.content_hash,
            metadata_ref: event.metadata_ref.clone(),
            file_url,
            note,
            timestamp: event.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use custody_core::CachedMetadata;
    use custody_ledger::EventPosition;

    fn event(metadata_ref: &str, file_url: Option<&str>) -> AppendEvent {
        AppendEvent {
            submitter: Address::from_bytes([3; 20]),
            content_hash: ContentHash::of(b"evidence"),
            metadata_ref: metadata_ref.into(),
            file_url: file_url.map(str::to_string),
            timestamp: Timestamp::from_secs(100),
            position: EventPosition::new(4, 0),
        }
    }

    #[test]
    fn inline_metadata_becomes_note() {
        let record = EvidenceRecord::from_event(&event("bag 7", None), &InMemoryCache::new());
        assert_eq!(record.note.as_deref(), Some("bag 7"));
        assert_eq!(record.id.to_string(), "4:0");
    }

    #[test]
    fn reference_is_resolved_from_cache() {
        let reference = ContentHash::of(b"meta").to_hex();
        let cache = InMemoryCache::new();
        cache
            .put(
                &reference,
                CachedMetadata {
                    note: Some("from cache".into()),
                    file_url: Some("http://cache/url".into()),
                },
            )
            .unwrap();
        let record = EvidenceRecord::from_event(&event(&reference, None), &cache);
        assert_eq!(record.note.as_deref(), Some("from cache"));
        assert_eq!(record.file_url.as_deref(), Some("http://cache/url"));
    }

    #[test]
    fn event_url_wins_over_cache() {
        let reference = ContentHash::of(b"meta").to_hex();
        let cache = InMemoryCache::new();
        cache
            .put(
                &reference,
                CachedMetadata {
                    note: None,
                    file_url: Some("http://cache/url".into()),
                },
            )
            .unwrap();
        let record = EvidenceRecord::from_event(&event(&reference, Some("http://event/url")), &cache);
        assert_eq!(record.file_url.as_deref(), Some("http://event/url"));
    }

    #[test]
    fn unknown_reference_has_no_note() {
        let reference = ContentHash::of(b"missing").to_hex();
        let record = EvidenceRecord::from_event(&event(&reference, None), &InMemoryCache::new());
        assert!(record.note.is_none());
        assert!(record.file_url.is_none());
    }
}
