//! # custody-client -- Typed HTTP client for the custody API
//!
//! Wraps every route of the custody API server in a typed async method and
//! implements [`custody_ledger::ChainProvider`] over HTTP so that a feed
//! view can reconcile a remote ledger.
//!
//! ## Wire Format
//!
//! Request and response bodies live in [`types`] and use camelCase JSON,
//! matching the server. Non-success responses surface as
//! [`ClientError::ApiError`] with the status and body intact; a 404 on a
//! lookup route becomes `Ok(None)`.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::CustodyClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use types::{
    CountResponse, EventsResponse, FeedResponse, HeadResponse, SubmitRequest,
    SubmitWithProofRequest, UploadResponse, VerifyRequest, VerifyResponse,
};
