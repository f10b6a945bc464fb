//! Request and response bodies of the custody API.
//!
//! These mirror the server's JSON exactly (camelCase field names) but are
//! defined here so the client does not depend on the server crate.

use custody_core::{Address, ContentHash, FieldElement, QueryMode};
use custody_feed::{EvidenceRecord, LoadState};
use custody_ledger::{AppendEvent, Submission};
use custody_zkp::Groth16Proof;
use serde::{Deserialize, Serialize};

/// Result of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// `0x`-prefixed Keccak-256 of the uploaded bytes.
    pub content_hash_hex: ContentHash,
    /// The same digest without the prefix.
    pub digest_hex: String,
    /// Storage name the file lives under.
    pub filename: String,
    /// Public download URL.
    pub url: String,
}

/// Body of `POST /v1/evidence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Account the record is attributed to.
    pub submitter: Address,
    /// Keccak-256 of the file bytes.
    pub content_hash: ContentHash,
    /// Inline metadata text or a metadata document hash.
    pub metadata_ref: String,
    /// Download location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Note the server caches under a referenced `metadata_ref`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SubmitRequest {
    /// The ledger submission this request carries.
    pub fn submission(&self) -> Submission {
        Submission {
            content_hash: self.content_hash,
            metadata_ref: self.metadata_ref.clone(),
            file_url: self.file_url.clone(),
        }
    }
}

/// Body of `POST /v1/evidence/proof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWithProofRequest {
    /// The record to append.
    #[serde(flatten)]
    pub record: SubmitRequest,
    /// Groth16 proof in snarkjs layout.
    pub proof: Groth16Proof,
    /// Public inputs the proof commits to.
    pub public_inputs: Vec<FieldElement>,
}

/// Result of `GET /v1/evidence/{submitter}/count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    /// The account queried.
    pub submitter: Address,
    /// Number of records it has appended.
    pub count: u64,
}

/// Result of `GET /v1/chain/head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadResponse {
    /// Latest block number.
    pub head: u64,
}

/// Result of `GET /v1/chain/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResponse {
    /// First block of the range.
    pub from: u64,
    /// Last block of the range, inclusive.
    pub to: u64,
    /// Events in chain order.
    pub events: Vec<AppendEvent>,
}

/// Result of `GET /v1/feed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResponse {
    /// Load state of the server's view.
    pub state: LoadState,
    /// Records in the view, before `limit` was applied.
    pub total: usize,
    /// Newest-first records.
    pub records: Vec<EvidenceRecord>,
}

/// Body of `POST /v1/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The typed hash or commitment.
    pub query: String,
    /// How to interpret `query`.
    #[serde(default)]
    pub mode: QueryMode,
}

/// Result of `POST /v1/verify` and `POST /v1/verify/file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Mode the query was validated under.
    pub mode: QueryMode,
    /// The 32 bytes matched against, as `0x` hex.
    pub target: String,
    /// Whether any record matched.
    pub matched: bool,
    /// Matching records, newest first.
    pub records: Vec<EvidenceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proof_request_flattens_record_fields() {
        let req = SubmitWithProofRequest {
            record: SubmitRequest {
                submitter: Address::from_bytes([0x11; 20]),
                content_hash: ContentHash::of(b"hello"),
                metadata_ref: "note".into(),
                file_url: None,
                note: None,
            },
            proof: custody_zkp::MockVerifier::prove(&[FieldElement::from_u128(1)]),
            public_inputs: vec![FieldElement::from_u128(1)],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["metadataRef"], json!("note"));
        assert_eq!(value["publicInputs"], json!(["1"]));
        assert!(value.get("fileUrl").is_none());
        assert!(value["proof"]["pi_a"].is_array());
    }

    #[test]
    fn verify_request_mode_defaults_to_digest() {
        let req: VerifyRequest = serde_json::from_value(json!({ "query": "0x00" })).unwrap();
        assert_eq!(req.mode, QueryMode::Digest);
    }
}
