//! # Content Store
//!
//! Stores uploaded files once under a name derived from their Keccak-256
//! content hash and serves them back read-only.
//!
//! ## Write-Once Invariant
//!
//! Identical bytes always resolve to a single storage name. When a blob is
//! put, the store first looks for any existing file carrying the same hash
//! (whatever its extension) and returns that name untouched, provided the
//! file still hashes to its name. A file that does not (a write cut short
//! by a crash, for instance) is removed and rewritten.
//!
//! New content is written to a temporary file in the store directory and
//! moved into place with a no-clobber rename, so a final name never holds
//! partial bytes. A concurrent writer that wins the race turns our write
//! into a no-op success. The final file is then marked read-only.
//!
//! ## Integrity Invariant
//!
//! Every read recomputes the hash of the bytes on disk and compares it
//! with the hash encoded in the name. Corruption or tampering is detected
//! at read time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use custody_core::ContentHash;
use parking_lot::Mutex;
use subtle::ConstantTimeEq;
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::naming::StorageName;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Outcome of a successful [`ContentStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Content hash of the bytes.
    pub hash: ContentHash,
    /// Name the blob is stored (or was already stored) under.
    pub storage_name: StorageName,
    /// Size in bytes.
    pub size: u64,
    /// `false` when the content was already present.
    pub created: bool,
}

/// A write-once content store backed by a single directory.
#[derive(Debug)]
pub struct ContentStore {
    base_dir: PathBuf,
    max_bytes: u64,
    // Serialises the lookup-then-create sequence within this process.
    write_lock: Mutex<()>,
}

impl ContentStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed.
    pub fn open(base_dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            max_bytes,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Configured size ceiling in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store `bytes` uploaded under the file name `original`.
    ///
    /// Re-uploading identical content returns the existing name with
    /// `created == false` and leaves the stored file untouched.
    pub fn put(&self, original: Option<&str>, bytes: &[u8]) -> Result<StoredBlob, StoreError> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(StoreError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        let hash = ContentHash::of(bytes);

        let _guard = self.write_lock.lock();
        if let Some(existing) = self.find_by_hash(&hash)? {
            match self.read_verified(&existing) {
                Ok(Some(_)) => {
                    tracing::debug!(name = %existing, "content already stored");
                    return Ok(StoredBlob {
                        hash,
                        storage_name: existing,
                        size,
                        created: false,
                    });
                }
                Ok(None) => {}
                Err(StoreError::Integrity { .. }) => {
                    tracing::warn!(name = %existing, "replacing corrupt blob");
                    self.remove(&existing)?;
                }
                Err(e) => return Err(e),
            }
        }

        let storage_name = StorageName::new(hash, original);
        let path = self.base_dir.join(storage_name.to_string());
        let mut tmp = NamedTempFile::new_in(&self.base_dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        let created = match tmp.persist_noclobber(&path) {
            Ok(_) => {
                let mut perms = fs::metadata(&path)?.permissions();
                perms.set_readonly(true);
                fs::set_permissions(&path, perms)?;
                true
            }
            // Same name means same hash means same content.
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => false,
            Err(e) => return Err(e.error.into()),
        };

        if created {
            tracing::info!(name = %storage_name, size, "stored new blob");
        }
        Ok(StoredBlob {
            hash,
            storage_name,
            size,
            created,
        })
    }

    /// Read a blob by storage name, verifying its integrity.
    ///
    /// Returns `Ok(None)` if nothing is stored under that name.
    pub fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let name = StorageName::parse(name)?;
        let bytes = self.read_verified(&name);
        if let Err(StoreError::Integrity { actual, .. }) = &bytes {
            tracing::error!(name = %name, actual = %actual, "stored blob failed integrity check");
        }
        bytes
    }

    fn read_verified(&self, name: &StorageName) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.base_dir.join(name.to_string());
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let actual = ContentHash::of(&bytes);
        if !bool::from(actual.as_bytes().ct_eq(name.hash().as_bytes())) {
            return Err(StoreError::Integrity {
                name: name.to_string(),
                actual: actual.to_hex(),
            });
        }
        Ok(Some(bytes))
    }

    fn remove(&self, name: &StorageName) -> Result<(), StoreError> {
        let path = self.base_dir.join(name.to_string());
        let mut perms = fs::metadata(&path)?.permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(&path, perms)?;
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Whether a blob is stored under `name`.
    pub fn contains(&self, name: &str) -> Result<bool, StoreError> {
        let name = StorageName::parse(name)?;
        Ok(self.base_dir.join(name.to_string()).is_file())
    }

    /// Find the name a given hash is stored under, if any.
    pub fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<StorageName>, StoreError> {
        Ok(self.list()?.into_iter().find(|n| n.hash() == hash))
    }

    /// All stored names, sorted.
    ///
    /// Files in the directory that do not follow the naming grammar are
    /// skipped.
    pub fn list(&self) -> Result<Vec<StorageName>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str() {
                if let Ok(name) = StorageName::parse(file_name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8";

    fn store() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path().join("uploads"), DEFAULT_MAX_BYTES).unwrap();
        (dir, store)
    }

    #[test]
    fn hello_is_stored_under_hash_and_extension() {
        let (_dir, store) = store();
        let blob = store.put(Some("hello.txt"), b"hello").unwrap();
        assert_eq!(blob.hash.to_hex(), HELLO);
        assert_eq!(blob.storage_name.to_string(), format!("{HELLO}.txt"));
        assert!(blob.created);
        assert_eq!(blob.size, 5);
    }

    #[test]
    fn reupload_is_idempotent() {
        let (_dir, store) = store();
        let first = store.put(Some("hello.txt"), b"hello").unwrap();
        let second = store.put(Some("hello.txt"), b"hello").unwrap();
        assert_eq!(first.storage_name, second.storage_name);
        assert!(!second.created);
        assert_eq!(
            store.get(&first.storage_name.to_string()).unwrap().unwrap(),
            b"hello"
        );
    }

    #[test]
    fn same_bytes_under_other_extension_resolve_to_existing_name() {
        let (_dir, store) = store();
        let first = store.put(Some("hello.txt"), b"hello").unwrap();
        let second = store.put(Some("greeting.md"), b"hello").unwrap();
        assert_eq!(first.storage_name, second.storage_name);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn stored_file_is_read_only() {
        let (_dir, store) = store();
        let blob = store.put(None, b"evidence").unwrap();
        let path = store.base_dir().join(blob.storage_name.to_string());
        assert!(fs::metadata(path).unwrap().permissions().readonly());
    }

    #[test]
    fn oversize_blob_is_rejected_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path(), 4).unwrap();
        let err = store.put(Some("big.bin"), b"12345").unwrap_err();
        assert!(matches!(err, StoreError::TooLarge { size: 5, limit: 4 }));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn missing_name_resolves_to_none() {
        let (_dir, store) = store();
        let name = format!("{}.txt", ContentHash::of(b"absent"));
        assert!(store.get(&name).unwrap().is_none());
        assert!(!store.contains(&name).unwrap());
    }

    #[test]
    fn traversal_names_are_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("../../etc/passwd"),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn get_detects_tampering() {
        let (_dir, store) = store();
        let blob = store.put(Some("a.txt"), b"original").unwrap();
        let path = store.base_dir().join(blob.storage_name.to_string());
        let mut perms = fs::metadata(&path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
        fs::write(&path, b"tampered").unwrap();

        let err = store.get(&blob.storage_name.to_string()).unwrap_err();
        assert!(
            format!("{err}").contains("integrity violation"),
            "expected integrity violation, got: {err}"
        );
    }

    #[test]
    fn list_skips_foreign_files() {
        let (_dir, store) = store();
        fs::write(store.base_dir().join("notes.txt"), b"x").unwrap();
        store.put(Some("b.bin"), b"b").unwrap();
        store.put(Some("a.bin"), b"a").unwrap();
        let names = store.list().unwrap();
        assert_eq!(names.len(), 2);
        assert!(names[0] < names[1]);
    }

    #[test]
    fn truncated_blob_is_replaced_on_reupload() {
        let (_dir, store) = store();
        let name = format!("{HELLO}.txt");
        fs::write(store.base_dir().join(&name), b"hel").unwrap();

        let blob = store.put(Some("hello.txt"), b"hello").unwrap();
        assert!(blob.created);
        assert_eq!(blob.storage_name.to_string(), name);
        assert_eq!(store.get(&name).unwrap().unwrap(), b"hello");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn no_temporary_files_are_left_behind() {
        let (_dir, store) = store();
        store.put(Some("hello.txt"), b"hello").unwrap();
        store.put(Some("hello.txt"), b"hello").unwrap();
        let entries = fs::read_dir(store.base_dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn empty_blob_is_storable() {
        let (_dir, store) = store();
        let blob = store.put(Some("empty.dat"), b"").unwrap();
        assert_eq!(store.get(&blob.storage_name.to_string()).unwrap().unwrap(), b"");
    }
}
