//! # Custody API Client
//!
//! One method per API route. Every request is sent once; a transport
//! failure surfaces as [`ClientError::Http`] and the caller decides whether
//! to re-issue.
//!
//! [`CustodyClient`] also implements [`ChainProvider`], which lets a
//! [`custody_feed::FeedView`] reconcile a remote ledger exactly as it would
//! an in-process one. The live subscription is emulated by polling the
//! remote head and fetching `(last_seen, head]` in chunks; the polling task
//! exits once every receiver has been dropped.

use std::time::Duration;

use custody_core::{Address, QueryMode};
use custody_ledger::{AppendEvent, ChainError, ChainProvider, DEFAULT_CHANNEL_CAPACITY};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{
    CountResponse, EventsResponse, FeedResponse, HeadResponse, SubmitRequest,
    SubmitWithProofRequest, UploadResponse, VerifyRequest, VerifyResponse,
};

/// Typed client for a custody API server.
#[derive(Debug, Clone)]
pub struct CustodyClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    chunk_size: u64,
}

impl CustodyClient {
    /// Build a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval(),
            chunk_size: config.chunk_size,
        })
    }

    /// Blocks per range query when this client backs a feed.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Upload a file to the content store.
    ///
    /// Calls `POST {base_url}/upload` with a multipart `file` field.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        let endpoint = "POST /upload".to_string();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let resp = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    /// Download a stored file by storage name. `None` if it does not exist.
    pub async fn download(&self, name: &str) -> Result<Option<Vec<u8>>, ClientError> {
        let endpoint = format!("GET /files/{name}");
        let url = self.url(&format!("/files/{name}"));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(&endpoint, resp).await?;
        let bytes = resp.bytes().await.map_err(|e| ClientError::Http {
            endpoint,
            source: e,
        })?;
        Ok(Some(bytes.to_vec()))
    }

    /// Append a record without a proof.
    ///
    /// Calls `POST {base_url}/v1/evidence`.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<AppendEvent, ClientError> {
        let endpoint = "POST /v1/evidence".to_string();
        let resp = self
            .http
            .post(self.url("/v1/evidence"))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    /// Append a record gated on a Groth16 proof.
    ///
    /// Calls `POST {base_url}/v1/evidence/proof`. A rejected proof comes
    /// back as [`ClientError::ApiError`] with status 422.
    pub async fn submit_with_proof(
        &self,
        request: &SubmitWithProofRequest,
    ) -> Result<AppendEvent, ClientError> {
        let endpoint = "POST /v1/evidence/proof".to_string();
        let resp = self
            .http
            .post(self.url("/v1/evidence/proof"))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    /// Number of records a submitter has appended.
    pub async fn count(&self, submitter: &Address) -> Result<u64, ClientError> {
        let endpoint = format!("GET /v1/evidence/{submitter}/count");
        let url = self.url(&format!("/v1/evidence/{submitter}/count"));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let body: CountResponse = read_json(endpoint, resp).await?;
        Ok(body.count)
    }

    /// A submitter's record by index. `None` if the index is out of range.
    pub async fn get(
        &self,
        submitter: &Address,
        index: u64,
    ) -> Result<Option<AppendEvent>, ClientError> {
        let endpoint = format!("GET /v1/evidence/{submitter}/{index}");
        let url = self.url(&format!("/v1/evidence/{submitter}/{index}"));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(endpoint, resp).await.map(Some)
    }

    /// Latest block number of the remote ledger.
    pub async fn chain_head(&self) -> Result<u64, ClientError> {
        let endpoint = "GET /v1/chain/head".to_string();
        let url = self.url("/v1/chain/head");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let body: HeadResponse = read_json(endpoint, resp).await?;
        Ok(body.head)
    }

    /// Append events in blocks `from..=to`. The server enforces its own
    /// range limit.
    pub async fn chain_events(&self, from: u64, to: u64) -> Result<Vec<AppendEvent>, ClientError> {
        let endpoint = format!("GET /v1/chain/events?from={from}&to={to}");
        let url = self.url("/v1/chain/events");
        let resp = self
            .http
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let body: EventsResponse = read_json(endpoint, resp).await?;
        Ok(body.events)
    }

    /// The server's reconciled feed, newest first.
    pub async fn feed(&self, limit: Option<usize>) -> Result<FeedResponse, ClientError> {
        let endpoint = "GET /v1/feed".to_string();
        let url = self.url("/v1/feed");
        let mut req = self.http.get(&url);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        let resp = req.send().await.map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        read_json(endpoint, resp).await
    }

    /// Verify a typed hash or commitment against the server's feed.
    pub async fn verify(&self, query: &str, mode: QueryMode) -> Result<VerifyResponse, ClientError> {
        let endpoint = "POST /v1/verify".to_string();
        let body = VerifyRequest {
            query: query.to_string(),
            mode,
        };
        let resp = self
            .http
            .post(self.url("/v1/verify"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    /// Verify a file's bytes against the server's feed.
    pub async fn verify_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<VerifyResponse, ClientError> {
        let endpoint = "POST /v1/verify/file".to_string();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let resp = self
            .http
            .post(self.url("/v1/verify/file"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    /// Whether the server reports itself ready.
    pub async fn ready(&self) -> Result<bool, ClientError> {
        let endpoint = "GET /health/readiness".to_string();
        let url = self.url("/health/readiness");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http { endpoint, source: e })?;
        Ok(resp.status().is_success())
    }

    async fn poll_events(self, tx: broadcast::Sender<AppendEvent>, mut last_seen: u64) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.receiver_count() == 0 {
                tracing::debug!(last_seen, "no subscribers left, polling stopped");
                break;
            }
            if let Err(e) = self.poll_once(&tx, &mut last_seen).await {
                tracing::warn!(error = %e, last_seen, "polling the custody API failed");
            }
        }
    }

    async fn poll_once(
        &self,
        tx: &broadcast::Sender<AppendEvent>,
        last_seen: &mut u64,
    ) -> Result<(), ClientError> {
        let head = self.chain_head().await?;
        while *last_seen < head {
            let from = *last_seen + 1;
            let to = head.min(from.saturating_add(self.chunk_size - 1));
            for event in self.chain_events(from, to).await? {
                // No receivers is not an error here; the next tick exits.
                let _ = tx.send(event);
            }
            *last_seen = to;
        }
        Ok(())
    }
}

impl ChainProvider for CustodyClient {
    async fn head(&self) -> Result<u64, ChainError> {
        Ok(self.chain_head().await?)
    }

    async fn events_in_range(&self, from: u64, to: u64) -> Result<Vec<AppendEvent>, ChainError> {
        Ok(self.chain_events(from, to).await?)
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<AppendEvent>, ChainError> {
        let start = self.chain_head().await?;
        let (tx, rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(self.clone().poll_events(tx, start));
        Ok(rx)
    }
}

async fn ensure_success(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::ApiError {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

async fn read_json<T: DeserializeOwned>(
    endpoint: String,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let resp = ensure_success(&endpoint, resp).await?;
    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint,
        source: e,
    })
}
