//! # Reconciled Feed API
//!
//! Serves the server-side feed view: every append event seen by backfill or
//! the live subscription, de-duplicated and newest first.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use custody_feed::LoadState;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::routes::RecordBody;
use crate::state::AppState;

/// Records returned when no limit is given.
pub const DEFAULT_FEED_LIMIT: usize = 100;

/// Largest accepted limit.
pub const MAX_FEED_LIMIT: usize = 1000;

/// Feed paging.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Newest records to return (default 100, at most 1000).
    pub limit: Option<usize>,
}

/// Load state of the feed view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum StateBody {
    Idle,
    Loading,
    Error(String),
}

impl From<LoadState> for StateBody {
    fn from(state: LoadState) -> Self {
        match state {
            LoadState::Idle => Self::Idle,
            LoadState::Loading => Self::Loading,
            LoadState::Error(message) => Self::Error(message),
        }
    }
}

/// A page of the reconciled feed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedResponse {
    pub state: StateBody,
    /// Records in the view before the limit was applied.
    pub total: usize,
    pub records: Vec<RecordBody>,
}

/// Build the feed router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/feed", get(feed))
}

/// GET /v1/feed: Newest records of the reconciled feed.
#[utoipa::path(
    get,
    path = "/v1/feed",
    params(FeedParams),
    responses((status = 200, description = "Feed page", body = FeedResponse)),
    tag = "feed"
)]
pub(crate) async fn feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Json<FeedResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .min(MAX_FEED_LIMIT);
    Json(FeedResponse {
        state: state.feed.state().into(),
        total: state.feed.len(),
        records: state
            .feed
            .recent(limit)
            .into_iter()
            .map(RecordBody::from)
            .collect(),
    })
}
