//! # Ledger Journal
//!
//! Optional write-ahead persistence for the ledger: one JSON-encoded
//! [`AppendEvent`] per line. A line is written and synced before the event
//! is committed to memory, and on start the whole file is replayed.
//!
//! Replay requires block numbers to run 1, 2, 3, ... without gaps. A
//! journal that violates this is reported, not repaired.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::types::AppendEvent;

/// Append-only JSONL journal.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open (or create) a journal and return the events it already holds.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Vec<AppendEvent>), LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let events = if path.exists() {
            replay(&path)?
        } else {
            Vec::new()
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!(path = %path.display(), replayed = events.len(), "ledger journal opened");
        Ok((Self { path, file }, events))
    }

    /// Durably append one event.
    pub fn append(&mut self, event: &AppendEvent) -> Result<(), LedgerError> {
        let mut line =
            serde_json::to_vec(event).map_err(|e| LedgerError::Journal(e.to_string()))?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn replay(path: &Path) -> Result<Vec<AppendEvent>, LedgerError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: AppendEvent = serde_json::from_str(&line)
            .map_err(|e| LedgerError::Journal(format!("line {}: {e}", n + 1)))?;
        let expected = events.len() as u64 + 1;
        if event.position.block_number != expected {
            return Err(LedgerError::Journal(format!(
                "line {}: block {} out of sequence (expected {expected})",
                n + 1,
                event.position.block_number
            )));
        }
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventPosition;
    use custody_core::{Address, ContentHash, Timestamp};

    fn event(block: u64) -> AppendEvent {
        AppendEvent {
            submitter: Address::from_bytes([1; 20]),
            content_hash: ContentHash::of(&block.to_be_bytes()),
            metadata_ref: format!("item {block}"),
            file_url: None,
            timestamp: Timestamp::from_secs(1_700_000_000 + block),
            position: EventPosition::new(block, 0),
        }
    }

    #[test]
    fn appended_events_replay_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        {
            let (mut journal, existing) = Journal::open(&path).unwrap();
            assert!(existing.is_empty());
            journal.append(&event(1)).unwrap();
            journal.append(&event(2)).unwrap();
        }
        let (_journal, replayed) = Journal::open(&path).unwrap();
        assert_eq!(replayed, vec![event(1), event(2)]);
    }

    #[test]
    fn gap_in_blocks_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let lines = [event(1), event(3)]
            .iter()
            .map(|e| serde_json::to_string(e).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, lines).unwrap();
        let err = Journal::open(&path).unwrap_err();
        assert!(err.to_string().contains("out of sequence"), "got {err}");
    }

    #[test]
    fn garbage_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();
        assert!(matches!(Journal::open(&path), Err(LedgerError::Journal(_))));
    }
}
