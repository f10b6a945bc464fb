//! # Metadata Cache
//!
//! Submitters may record a metadata *reference* on the ledger instead of
//! inline text. The note and download URL behind that reference live in a
//! local key-value cache under the key `"metaCache:" + metadataRef`.
//!
//! Two implementations: [`InMemoryCache`] and [`JsonFileCache`], the latter
//! persisting the whole map as one JSON object.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use custody_core::CachedMetadata;
use parking_lot::RwLock;

use crate::error::FeedError;

/// Key prefix for cached metadata documents.
pub const CACHE_KEY_PREFIX: &str = "metaCache:";

/// The cache key for a metadata reference.
pub fn cache_key(metadata_ref: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{metadata_ref}")
}

/// A store of metadata documents keyed by metadata reference.
pub trait MetadataCache: Send + Sync {
    /// Look up the document for `metadata_ref`.
    fn get(&self, metadata_ref: &str) -> Option<CachedMetadata>;

    /// Store the document for `metadata_ref`, replacing any previous one.
    fn put(&self, metadata_ref: &str, doc: CachedMetadata) -> Result<(), FeedError>;
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CachedMetadata>>,
}

impl InMemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataCache for InMemoryCache {
    fn get(&self, metadata_ref: &str) -> Option<CachedMetadata> {
        self.entries.read().get(&cache_key(metadata_ref)).cloned()
    }

    fn put(&self, metadata_ref: &str, doc: CachedMetadata) -> Result<(), FeedError> {
        self.entries.write().insert(cache_key(metadata_ref), doc);
        Ok(())
    }
}

/// Cache persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, CachedMetadata>>,
}

impl JsonFileCache {
    /// Open the cache at `path`. A missing file is an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| FeedError::Cache(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, CachedMetadata>) -> Result<(), FeedError> {
        let bytes =
            serde_json::to_vec_pretty(entries).map_err(|e| FeedError::Cache(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MetadataCache for JsonFileCache {
    fn get(&self, metadata_ref: &str) -> Option<CachedMetadata> {
        self.entries.read().get(&cache_key(metadata_ref)).cloned()
    }

    fn put(&self, metadata_ref: &str, doc: CachedMetadata) -> Result<(), FeedError> {
        let mut entries = self.entries.write();
        entries.insert(cache_key(metadata_ref), doc);
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(note: &str) -> CachedMetadata {
        CachedMetadata {
            note: Some(note.into()),
            file_url: Some("http://localhost:8080/files/x".into()),
        }
    }

    #[test]
    fn key_has_prefix() {
        assert_eq!(cache_key("0xabc"), "metaCache:0xabc");
    }

    #[test]
    fn in_memory_put_then_get() {
        let cache = InMemoryCache::new();
        assert!(cache.get("r").is_none());
        cache.put("r", doc("first")).unwrap();
        cache.put("r", doc("second")).unwrap();
        assert_eq!(cache.get("r").unwrap().note.as_deref(), Some("second"));
    }

    #[test]
    fn file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        {
            let cache = JsonFileCache::open(&path).unwrap();
            cache.put("0xref", doc("kept")).unwrap();
        }
        let reopened = JsonFileCache::open(&path).unwrap();
        assert_eq!(reopened.get("0xref").unwrap().note.as_deref(), Some("kept"));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["metaCache:0xref"]["fileUrl"], "http://localhost:8080/files/x");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "[1,2").unwrap();
        assert!(matches!(JsonFileCache::open(&path), Err(FeedError::Cache(_))));
    }
}
