//! # custody-cli: Command-Line Interface for the Custody Stack
//!
//! Subcommand handlers for the `custody` binary. Each handler returns
//! `anyhow::Result<u8>`: the `u8` is the process exit code on success
//! (`0` for found/verified, `1` for not-found/not-matched), and an `Err` is
//! reported by `main` with exit code `1`.
//!
//! ## Subcommands
//!
//! | Command    | Module          | Network |
//! |------------|-----------------|---------|
//! | `hash`     | [`hash`]        | no      |
//! | `upload`, `submit`, `count`, `get` | [`evidence`] | yes |
//! | `verify`, `watch` | [`verify`] | yes  |
//! | `proof`    | [`proof`]       | no      |

pub mod evidence;
pub mod hash;
pub mod proof;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use custody_client::{ClientConfig, CustodyClient};
use custody_feed::EvidenceRecord;

/// Build a client for `api_url`, taking timeouts and polling from the
/// environment.
pub fn connect(api_url: &str) -> Result<CustodyClient> {
    let mut config = ClientConfig::from_env().context("invalid client environment")?;
    config.api_url = ClientConfig::for_url(api_url)
        .with_context(|| format!("invalid --api URL: {api_url}"))?
        .api_url;
    tracing::debug!(api = %config.api_url, "connecting");
    CustodyClient::new(config).context("failed to build HTTP client")
}

/// Read a whole file. Returns its final path component and bytes.
pub fn read_input(path: &Path) -> Result<(String, Vec<u8>)> {
    if !path.is_file() {
        anyhow::bail!("file not found: {}", path.display());
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());
    Ok((name, bytes))
}

/// One-line rendering of a feed record.
pub fn format_record(record: &EvidenceRecord) -> String {
    let mut line = format!(
        "{:>10}  {}  {}  {}",
        record.id.to_string(),
        record.timestamp,
        record.submitter,
        record.content_hash
    );
    if let Some(note) = &record.note {
        line.push_str(&format!("  \"{note}\""));
    }
    if let Some(url) = &record.file_url {
        line.push_str(&format!("  {url}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_core::{Address, ContentHash, Timestamp};
    use custody_ledger::EventPosition;

    #[test]
    fn read_input_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn read_input_returns_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exhibit.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let (name, bytes) = read_input(&path).unwrap();
        assert_eq!(name, "exhibit.pdf");
        assert_eq!(bytes, b"%PDF");
    }

    #[test]
    fn format_record_includes_note_and_unknown_time() {
        let record = EvidenceRecord {
            id: EventPosition::new(3, 0).id(),
            submitter: Address::from_bytes([0x11; 20]),
            content_hash: ContentHash::of(b"hello"),
            metadata_ref: "exhibit A".into(),
            file_url: None,
            note: Some("exhibit A".into()),
            timestamp: Timestamp::UNKNOWN,
        };
        let line = format_record(&record);
        assert!(line.contains("3:0"));
        assert!(line.contains("unknown"));
        assert!(line.contains("\"exhibit A\""));
    }

    #[test]
    fn connect_rejects_bad_url() {
        assert!(connect("not a url").is_err());
    }
}
