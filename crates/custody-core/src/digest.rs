//! # Content Hashes
//!
//! Defines [`ContentHash`], the Keccak-256 digest of a file's exact bytes.
//! It is the identifier under which a file is stored, the value recorded on
//! the evidence ledger, and the key that verification lookups match on.
//!
//! ## Textual Form
//!
//! A content hash renders as `0x` followed by 64 lowercase hex digits.
//! Parsing accepts upper- or mixed-case hex but always requires the `0x`
//! prefix and the exact length, so a typo is rejected rather than silently
//! matching nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::ValidationError;

/// Length of a content hash in bytes.
pub const HASH_LEN: usize = 32;

/// Compute the raw Keccak-256 digest of a byte slice.
pub fn keccak256(bytes: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// A Keccak-256 content hash.
///
/// Identical bytes always produce the same hash; the hash is therefore a
/// stable storage key and ledger identifier for a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Hash the exact bytes of a file.
    pub fn of(bytes: &[u8]) -> Self {
        Self(keccak256(bytes))
    }

    /// Wrap an existing 32-byte digest.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the `0x`-prefixed textual form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidContentHash(s.to_string()))?;
        if hex_part.len() != HASH_LEN * 2 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidContentHash(s.to_string()));
        }
        let mut out = [0u8; HASH_LEN];
        hex::decode_to_slice(hex_part, &mut out)
            .map_err(|_| ValidationError::InvalidContentHash(s.to_string()))?;
        Ok(Self(out))
    }

    /// Whether a string has the shape of a content hash.
    pub fn looks_like(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Lowercase hex without the prefix.
    pub fn to_bare_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental Keccak-256 hasher for inputs that arrive in chunks
/// (multipart uploads, large files read from disk).
#[derive(Clone, Default)]
pub struct Keccak256Accumulator {
    hasher: Keccak256,
}

impl Keccak256Accumulator {
    /// Start a new accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed another chunk.
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Finish and return the content hash.
    pub fn finalize(self) -> ContentHash {
        ContentHash(self.hasher.finalize().into())
    }
}
