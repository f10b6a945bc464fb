//! # Metadata References
//!
//! An evidence record's metadata is either short inline text or the content
//! hash of a metadata document held elsewhere. Reference-form metadata is
//! resolved against the local metadata cache when the feed is built.

use serde::{Deserialize, Serialize};

use crate::digest::ContentHash;
use crate::error::ValidationError;

/// Longest accepted metadata reference, in characters.
pub const MAX_METADATA_REF_LEN: usize = 1024;

/// Longest accepted file URL, in characters.
pub const MAX_FILE_URL_LEN: usize = 2048;

/// Interpretation of a record's `metadataRef` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRef {
    /// The text parses as a content hash.
    Reference(ContentHash),
    /// Free-form inline text.
    Inline(String),
}

impl MetadataRef {
    /// Classify a raw metadata string.
    pub fn classify(raw: &str) -> Self {
        match ContentHash::parse(raw) {
            Ok(hash) => Self::Reference(hash),
            Err(_) => Self::Inline(raw.to_string()),
        }
    }

    /// Whether this is a reference to an external document.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

/// Validate a metadata reference before it is written anywhere.
pub fn validate_metadata_ref(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "metadataRef",
            reason: "must not be empty".into(),
        });
    }
    if raw.chars().count() > MAX_METADATA_REF_LEN {
        return Err(ValidationError::InvalidField {
            field: "metadataRef",
            reason: format!("exceeds {MAX_METADATA_REF_LEN} characters"),
        });
    }
    Ok(())
}

/// Validate an optional file URL.
pub fn validate_file_url(raw: Option<&str>) -> Result<(), ValidationError> {
    let Some(url) = raw else {
        return Ok(());
    };
    if url.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "fileUrl",
            reason: "must not be empty when present".into(),
        });
    }
    if url.chars().count() > MAX_FILE_URL_LEN {
        return Err(ValidationError::InvalidField {
            field: "fileUrl",
            reason: format!("exceeds {MAX_FILE_URL_LEN} characters"),
        });
    }
    Ok(())
}

/// A metadata document as stored under `"metaCache:" + metadataRef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedMetadata {
    /// Human note attached at submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Where the file can be downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_shaped_text_is_a_reference() {
        let hash = ContentHash::of(b"meta");
        assert_eq!(MetadataRef::classify(&hash.to_hex()), MetadataRef::Reference(hash));
    }

    #[test]
    fn other_text_is_inline() {
        assert_eq!(
            MetadataRef::classify("seized laptop, bag 4"),
            MetadataRef::Inline("seized laptop, bag 4".into())
        );
    }

    #[test]
    fn empty_and_oversized_refs_are_rejected() {
        assert!(validate_metadata_ref("").is_err());
        assert!(validate_metadata_ref("  ").is_err());
        assert!(validate_metadata_ref(&"a".repeat(MAX_METADATA_REF_LEN)).is_ok());
        assert!(validate_metadata_ref(&"a".repeat(MAX_METADATA_REF_LEN + 1)).is_err());
    }

    #[test]
    fn file_url_is_optional_but_bounded() {
        assert!(validate_file_url(None).is_ok());
        assert!(validate_file_url(Some("")).is_err());
        assert!(validate_file_url(Some(&"u".repeat(MAX_FILE_URL_LEN + 1))).is_err());
    }

    #[test]
    fn cached_metadata_uses_camel_case() {
        let doc: CachedMetadata =
            serde_json::from_str(r#"{"note":"n","fileUrl":"http://x/f"}"#).unwrap();
        assert_eq!(doc.file_url.as_deref(), Some("http://x/f"));
        assert_eq!(serde_json::to_string(&CachedMetadata::default()).unwrap(), "{}");
    }
}
