//! # Route Modules
//!
//! One router per concern, merged in [`crate::app`].

pub mod chain;
pub mod evidence;
pub mod feed;
pub mod files;
pub mod verify;

use custody_feed::EvidenceRecord;
use custody_ledger::AppendEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Block and log index of an append event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionBody {
    pub block_number: u64,
    pub log_index: u32,
}

/// An append event as returned by the ledger routes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    /// `0x` + 40 hex.
    pub submitter: String,
    /// `0x` + 64 hex.
    pub content_hash: String,
    pub metadata_ref: String,
    pub file_url: Option<String>,
    /// Seconds since epoch; `0` when unknown.
    pub timestamp: u64,
    pub position: PositionBody,
}

impl From<AppendEvent> for EventBody {
    fn from(event: AppendEvent) -> Self {
        Self {
            submitter: event.submitter.to_hex(),
            content_hash: event.content_hash.to_hex(),
            metadata_ref: event.metadata_ref,
            file_url: event.file_url,
            timestamp: event.timestamp.as_secs(),
            position: PositionBody {
                block_number: event.position.block_number,
                log_index: event.position.log_index,
            },
        }
    }
}

/// A reconciled feed record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordBody {
    /// `"<block>:<log>"`.
    pub id: String,
    pub submitter: String,
    pub content_hash: String,
    pub metadata_ref: String,
    pub file_url: Option<String>,
    pub note: Option<String>,
    pub timestamp: u64,
}

impl From<EvidenceRecord> for RecordBody {
    fn from(record: EvidenceRecord) -> Self {
        Self {
            id: record.id.to_string(),
            submitter: record.submitter.to_hex(),
            content_hash: record.content_hash.to_hex(),
            metadata_ref: record.metadata_ref,
            file_url: record.file_url,
            note: record.note,
            timestamp: record.timestamp.as_secs(),
        }
    }
}
