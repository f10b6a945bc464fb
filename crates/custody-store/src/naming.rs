//! # Storage Names
//!
//! A stored blob's file name is its content hash in `0x` form, optionally
//! followed by the lowercased extension of the name it was uploaded under.
//! The grammar is
//!
//! ```text
//! 0x[0-9a-f]{64}(\.[a-z0-9]{1,16})?
//! ```
//!
//! which rules out path separators, `..`, and hidden files, so a validated
//! name can be joined onto the store directory without further checks.

use std::fmt;

use custody_core::ContentHash;

use crate::error::StoreError;

/// Longest extension kept from an original file name.
pub const MAX_EXTENSION_LEN: usize = 16;

/// Extract the storable extension of an uploaded file's name.
///
/// Takes the last extension, lowercases it, and drops it unless it is
/// 1 to 16 ASCII alphanumerics.
pub fn sanitize_extension(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

/// A validated storage name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageName {
    hash: ContentHash,
    extension: Option<String>,
}

impl StorageName {
    /// Derive the name for a blob uploaded as `original`.
    pub fn new(hash: ContentHash, original: Option<&str>) -> Self {
        Self {
            hash,
            extension: original.and_then(sanitize_extension),
        }
    }

    /// Validate a name received from outside.
    pub fn parse(name: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidName(name.to_string());
        let (hash_part, extension) = match name.split_once('.') {
            Some((h, e)) => (h, Some(e)),
            None => (name, None),
        };
        if hash_part.len() != 66
            || !hash_part.starts_with("0x")
            || hash_part[2..].bytes().any(|b| b.is_ascii_uppercase())
        {
            return Err(invalid());
        }
        let hash = ContentHash::parse(hash_part).map_err(|_| invalid())?;
        let extension = match extension {
            None => None,
            Some(e)
                if !e.is_empty()
                    && e.len() <= MAX_EXTENSION_LEN
                    && e.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) =>
            {
                Some(e.to_string())
            }
            Some(_) => return Err(invalid()),
        };
        Ok(Self { hash, extension })
    }

    /// The content hash encoded in the name.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// The sanitised extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

impl fmt::Display for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension {
            Some(ext) => write!(f, "{}.{}", self.hash, ext),
            None => write!(f, "{}", self.hash),
        }
    }
}

impl fmt::Debug for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageName({self})")
    }
}
