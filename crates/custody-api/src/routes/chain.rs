//! # Chain Read API
//!
//! The provider surface a remote reconciliation view consumes: the current
//! head and bounded historical range queries. The ledger's host range limit
//! applies here exactly as it does in-process.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::routes::EventBody;
use crate::state::AppState;

/// Latest block.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HeadResponse {
    pub head: u64,
}

/// Inclusive block range.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// First block.
    pub from: u64,
    /// Last block, inclusive.
    pub to: u64,
}

/// Events in a block range.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventsResponse {
    pub from: u64,
    pub to: u64,
    pub events: Vec<EventBody>,
}

/// Build the chain router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/chain/head", get(head))
        .route("/v1/chain/events", get(events))
}

/// GET /v1/chain/head: Latest block number.
#[utoipa::path(
    get,
    path = "/v1/chain/head",
    responses((status = 200, description = "Latest block", body = HeadResponse)),
    tag = "chain"
)]
pub(crate) async fn head(State(state): State<AppState>) -> Json<HeadResponse> {
    Json(HeadResponse {
        head: state.ledger.head(),
    })
}

/// GET /v1/chain/events: Append events in `from..=to`.
#[utoipa::path(
    get,
    path = "/v1/chain/events",
    params(RangeParams),
    responses(
        (status = 200, description = "Events in chain order", body = EventsResponse),
        (status = 400, description = "Missing or malformed range", body = crate::error::ErrorBody),
        (status = 422, description = "Range inverted or wider than the host limit", body = crate::error::ErrorBody),
    ),
    tag = "chain"
)]
pub(crate) async fn events(
    State(state): State<AppState>,
    range: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<EventsResponse>, AppError> {
    let Query(range) = range.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let events = state.ledger.events_in_range(range.from, range.to)?;
    Ok(Json(EventsResponse {
        from: range.from,
        to: range.to,
        events: events.into_iter().map(EventBody::from).collect(),
    }))
}
