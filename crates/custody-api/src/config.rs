//! # Server Configuration
//!
//! [`AppConfig`] is read once at startup from `CUSTODY_*` environment
//! variables. Every value has a default except the verifying key, which is
//! required only when the Groth16 verifier is selected.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use custody_ledger::DEFAULT_MAX_LOG_RANGE;
use custody_store::DEFAULT_MAX_BYTES;
use thiserror::Error;

/// Which proof verifier gates `POST /v1/evidence/proof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierKind {
    /// Deterministic test verifier.
    Mock,
    /// Groth16 over BN254, from a snarkjs verifying key.
    Groth16,
}

impl FromStr for VerifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "groth16" => Ok(Self::Groth16),
            other => Err(ConfigError::Invalid {
                var: "CUSTODY_VERIFIER",
                value: other.to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to listen on.
    pub bind: SocketAddr,
    /// Content store directory.
    pub storage_dir: PathBuf,
    /// Upload size ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Public base URL used to build download links.
    pub public_url: String,
    /// Ledger journal path. `None` keeps the ledger in memory only.
    pub ledger_journal: Option<PathBuf>,
    /// Metadata cache file. `None` keeps the cache in memory only.
    pub metadata_cache: Option<PathBuf>,
    /// Widest block range `GET /v1/chain/events` will serve.
    pub max_log_range: u64,
    /// Chunk size used by the server-side feed backfill.
    pub feed_chunk: u64,
    /// Proof verifier selection.
    pub verifier: VerifierKind,
    /// snarkjs verifying key, required for [`VerifierKind::Groth16`].
    pub verifying_key: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            storage_dir: PathBuf::from("./uploads"),
            max_upload_bytes: DEFAULT_MAX_BYTES,
            public_url: "http://localhost:8080".to_string(),
            ledger_journal: None,
            metadata_cache: None,
            max_log_range: DEFAULT_MAX_LOG_RANGE,
            feed_chunk: custody_feed::DEFAULT_CHUNK_SIZE,
            verifier: VerifierKind::Mock,
            verifying_key: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CUSTODY_BIND` (default: `0.0.0.0:8080`); `PORT` overrides the port
    /// - `CUSTODY_STORAGE_DIR` (default: `./uploads`)
    /// - `CUSTODY_MAX_UPLOAD_BYTES` (default: 10485760)
    /// - `CUSTODY_PUBLIC_URL` (default: `http://localhost:8080`)
    /// - `CUSTODY_LEDGER_JOURNAL` (default: unset, in-memory ledger)
    /// - `CUSTODY_METADATA_CACHE` (default: unset, in-memory cache)
    /// - `CUSTODY_MAX_LOG_RANGE` (default: 10000)
    /// - `CUSTODY_FEED_CHUNK` (default: 5000)
    /// - `CUSTODY_VERIFIER` (`mock` or `groth16`, default: `mock`)
    /// - `CUSTODY_VERIFYING_KEY` (path, required for `groth16`)
    /// - `CUSTODY_LOG_FORMAT` (`text` or `json`, default: `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut bind = match env("CUSTODY_BIND") {
            Some(raw) => parse_var("CUSTODY_BIND", &raw)?,
            None => defaults.bind,
        };
        if let Some(raw) = env("PORT") {
            bind.set_port(parse_var("PORT", &raw)?);
        }

        let verifier = match env("CUSTODY_VERIFIER") {
            Some(raw) => raw.parse()?,
            None => defaults.verifier,
        };
        let verifying_key = env("CUSTODY_VERIFYING_KEY").map(PathBuf::from);
        if verifier == VerifierKind::Groth16 && verifying_key.is_none() {
            return Err(ConfigError::Missing("CUSTODY_VERIFYING_KEY"));
        }

        let log_format = match env("CUSTODY_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "CUSTODY_LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind,
            storage_dir: env("CUSTODY_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            max_upload_bytes: env_or("CUSTODY_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            public_url: env("CUSTODY_PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
            ledger_journal: env("CUSTODY_LEDGER_JOURNAL").map(PathBuf::from),
            metadata_cache: env("CUSTODY_METADATA_CACHE").map(PathBuf::from),
            max_log_range: env_or("CUSTODY_MAX_LOG_RANGE", defaults.max_log_range)?,
            feed_chunk: env_or("CUSTODY_FEED_CHUNK", defaults.feed_chunk)?,
            verifier,
            verifying_key,
            log_format,
        })
    }

    /// Public download URL for a storage name.
    pub fn file_url(&self, storage_name: &str) -> String {
        format!("{}/files/{storage_name}", self.public_url)
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable held an unusable value.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The value as given.
        value: String,
    },

    /// A required variable is unset.
    #[error("{0} must be set")]
    Missing(&'static str),
}

fn env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env(var) {
        Some(raw) => parse_var(var, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind.port(), 8080);
        assert_eq!(cfg.max_upload_bytes, 10_485_760);
        assert_eq!(cfg.max_log_range, 10_000);
        assert_eq!(cfg.feed_chunk, 5_000);
        assert_eq!(cfg.verifier, VerifierKind::Mock);
        assert!(cfg.ledger_journal.is_none());
    }

    #[test]
    fn file_url_joins_public_base() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.file_url("0xab.txt"),
            "http://localhost:8080/files/0xab.txt"
        );
    }

    #[test]
    fn verifier_kind_parses_case_insensitively() {
        assert_eq!("GROTH16".parse::<VerifierKind>().unwrap(), VerifierKind::Groth16);
        assert!("plonk".parse::<VerifierKind>().is_err());
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("CUSTODY_TEST_BAD_RANGE", "lots");
        let result: Result<u64, _> = env_or("CUSTODY_TEST_BAD_RANGE", 1);
        std::env::remove_var("CUSTODY_TEST_BAD_RANGE");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
