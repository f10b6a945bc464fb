//! # Ledger Types
//!
//! Wire and storage shapes for the evidence ledger. All JSON uses camelCase
//! field names.

use std::fmt;
use std::str::FromStr;

use custody_core::{
    validate_file_url, validate_metadata_ref, Address, ContentHash, Timestamp, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Where an append event sits in the chain.
///
/// Ordered by block number, then log index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPosition {
    /// Block the event was emitted in.
    pub block_number: u64,
    /// Index of the log within its block.
    pub log_index: u32,
}

impl EventPosition {
    /// Build a position.
    pub fn new(block_number: u64, log_index: u32) -> Self {
        Self {
            block_number,
            log_index,
        }
    }

    /// The stable de-duplication key for the event at this position.
    pub fn id(&self) -> EventId {
        EventId(*self)
    }
}

/// Stable identifier of an append event, rendered `"<block>:<log>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(EventPosition);

impl EventId {
    /// The position this id names.
    pub fn position(&self) -> EventPosition {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.block_number, self.0.log_index)
    }
}

impl FromStr for EventId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidField {
            field: "id",
            reason: format!("expected \"<block>:<log>\", got {s:?}"),
        };
        let (block, log) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self(EventPosition::new(
            block.parse().map_err(|_| invalid())?,
            log.parse().map_err(|_| invalid())?,
        )))
    }
}

impl Serialize for EventId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What a submitter asks the ledger to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Keccak-256 of the file bytes.
    pub content_hash: ContentHash,
    /// Inline metadata text or the content hash of a metadata document.
    pub metadata_ref: String,
    /// Where the file can be fetched, if anywhere.
    #[serde(default)]
    pub file_url: Option<String>,
}

impl Submission {
    /// Check field bounds. Runs before any side effect.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_metadata_ref(&self.metadata_ref)?;
        validate_file_url(self.file_url.as_deref())
    }
}

/// The event emitted for every accepted append, and the record kept in the
/// submitter's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEvent {
    /// Account that submitted the record.
    pub submitter: Address,
    /// Keccak-256 of the file bytes.
    pub content_hash: ContentHash,
    /// Metadata text or reference.
    pub metadata_ref: String,
    /// Download location, if provided.
    #[serde(default)]
    pub file_url: Option<String>,
    /// Block time in seconds; `0` when unknown.
    #[serde(default)]
    pub timestamp: Timestamp,
    /// Block and log index.
    pub position: EventPosition,
}

impl AppendEvent {
    /// The de-duplication key of this event.
    pub fn id(&self) -> EventId {
        self.position.id()
    }
}
