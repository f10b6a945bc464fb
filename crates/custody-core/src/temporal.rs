//! # Temporal Types
//!
//! Ledger timestamps are whole seconds since the Unix epoch. The value `0`
//! means "unknown": records carrying it sort after every dated record in
//! the reconciled feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch; `0` is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The unknown timestamp.
    pub const UNKNOWN: Self = Self(0);

    /// Current wall clock, truncated to seconds.
    pub fn now() -> Self {
        Self(u64::try_from(Utc::now().timestamp()).unwrap_or(0))
    }

    /// Wrap a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Raw seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether the timestamp is unknown.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }

    /// UTC datetime, or `None` when unknown or out of range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if self.is_unknown() {
            return None;
        }
        DateTime::from_timestamp(i64::try_from(self.0).ok()?, 0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unknown() {
        assert!(Timestamp::UNKNOWN.is_unknown());
        assert_eq!(Timestamp::UNKNOWN.to_string(), "unknown");
    }

    #[test]
    fn now_is_known() {
        assert!(!Timestamp::now().is_unknown());
    }

    #[test]
    fn display_is_utc_with_z_suffix() {
        assert_eq!(Timestamp::from_secs(1_700_000_000).to_string(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Timestamp::from_secs(5)).unwrap(), "5");
    }
}
