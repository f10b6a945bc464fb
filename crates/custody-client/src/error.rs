//! Error types for custody API client operations.

use custody_ledger::ChainError;

use crate::config::ConfigError;

/// Errors from custody API operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error (connection refused, timeout, TLS failure).
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        /// Endpoint path that failed.
        endpoint: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("custody API error at {endpoint} (HTTP {status}): {body}")]
    ApiError {
        /// Endpoint path that returned the error.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint path.
        endpoint: String,
        /// Underlying deserialization error.
        source: reqwest::Error,
    },

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for ChainError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, ref body, .. } if status < 500 => {
                ChainError::Rejected(format!("HTTP {status}: {body}"))
            }
            ClientError::Deserialization { .. } => ChainError::Decode(err.to_string()),
            other => ChainError::Unreachable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_onto_chain_errors() {
        let rejected = ClientError::ApiError {
            endpoint: "/v1/chain/events".into(),
            status: 422,
            body: "range too large".into(),
        };
        assert!(matches!(ChainError::from(rejected), ChainError::Rejected(_)));

        let down = ClientError::ApiError {
            endpoint: "/v1/chain/head".into(),
            status: 503,
            body: String::new(),
        };
        assert!(matches!(ChainError::from(down), ChainError::Unreachable(_)));
    }

    #[test]
    fn status_is_exposed_for_api_errors() {
        let err = ClientError::ApiError {
            endpoint: "/upload".into(),
            status: 413,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(413));
        let cfg: ClientError = ConfigError::InvalidUrl("x".into(), "y".into()).into();
        assert_eq!(cfg.status(), None);
    }
}
