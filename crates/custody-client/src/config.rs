//! Client configuration.
//!
//! Defaults point at a locally running custody API. Override via
//! environment variables or explicit construction for tests.

use std::time::Duration;

use url::Url;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Configuration for connecting to a custody API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API. Default: <http://localhost:8080>
    pub api_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// How often a live subscription polls the remote head, in milliseconds.
    pub poll_interval_ms: u64,
    /// Widest block range requested in a single events call.
    pub chunk_size: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CUSTODY_API_URL` (default: `http://localhost:8080`)
    /// - `CUSTODY_TIMEOUT_SECS` (default: 30)
    /// - `CUSTODY_POLL_INTERVAL_MS` (default: 2000)
    /// - `CUSTODY_CHUNK_SIZE` (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: env_url("CUSTODY_API_URL", DEFAULT_API_URL)?,
            timeout_secs: env_u64("CUSTODY_TIMEOUT_SECS", 30)?,
            poll_interval_ms: env_u64("CUSTODY_POLL_INTERVAL_MS", 2_000)?,
            chunk_size: env_u64("CUSTODY_CHUNK_SIZE", custody_feed::DEFAULT_CHUNK_SIZE)?,
        })
    }

    /// Configuration for an explicit base URL with default tuning.
    pub fn for_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: Url::parse(api_url)
                .map_err(|e| ConfigError::InvalidUrl(api_url.to_string(), e.to_string()))?,
            timeout_secs: 30,
            poll_interval_ms: 2_000,
            chunk_size: custody_feed::DEFAULT_CHUNK_SIZE,
        })
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject tuning values a client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidNumber("chunk_size".into(), "0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidNumber("poll_interval_ms".into(), "0".into()));
        }
        Ok(())
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable did not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// A numeric variable did not parse.
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_url_uses_default_tuning() {
        let cfg = ClientConfig::for_url("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.api_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(2_000));
        assert_eq!(cfg.chunk_size, 5_000);
    }

    #[test]
    fn for_url_rejects_garbage() {
        assert!(matches!(
            ClientConfig::for_url("not a url"),
            Err(ConfigError::InvalidUrl(_, _))
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut cfg = ClientConfig::for_url("http://127.0.0.1:9000").unwrap();
        assert!(cfg.validate().is_ok());
        cfg.poll_interval_ms = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidNumber(var, _)) if var == "poll_interval_ms"
        ));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut cfg = ClientConfig::for_url("http://127.0.0.1:9000").unwrap();
        cfg.chunk_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("CUSTODY_NONEXISTENT_URL_VAR", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_u64_rejects_non_numeric() {
        std::env::set_var("CUSTODY_TEST_BAD_NUMBER", "soon");
        let result = env_u64("CUSTODY_TEST_BAD_NUMBER", 1);
        std::env::remove_var("CUSTODY_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidNumber(_, _))));
    }

    #[test]
    fn env_u64_defaults_when_absent() {
        assert_eq!(env_u64("CUSTODY_NONEXISTENT_NUMBER_VAR", 7).unwrap(), 7);
    }
}
