//! # custody-api: Axum API Server for the Custody Stack
//!
//! Exposes the content store, the evidence ledger, the ledger's chain read
//! surface, and a server-side reconciled feed over HTTP.
//!
//! ## API Surface
//!
//! | Prefix             | Module                 | Domain                    |
//! |--------------------|------------------------|---------------------------|
//! | `/upload`, `/files/*` | [`routes::files`]   | Content store             |
//! | `/v1/evidence/*`   | [`routes::evidence`]   | Ledger writes and reads   |
//! | `/v1/chain/*`      | [`routes::chain`]      | Chain provider surface    |
//! | `/v1/feed`         | [`routes::feed`]       | Reconciled feed           |
//! | `/v1/verify*`      | [`routes::verify`]     | Verification lookups      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros at `/openapi.json`.

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use custody_feed::LoadState;
use tower_http::trace::TraceLayer;

/// Headroom over the file size ceiling for multipart framing.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Body limit for JSON routes.
const JSON_BODY_LIMIT: usize = 256 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let upload_limit =
        usize::try_from(state.store.max_bytes().saturating_add(MULTIPART_OVERHEAD))
            .unwrap_or(usize::MAX);

    let uploads = Router::new()
        .merge(routes::files::router())
        .merge(routes::verify::file_router())
        .layer(DefaultBodyLimit::max(upload_limit));

    let api = Router::new()
        .merge(routes::evidence::router())
        .merge(routes::chain::router())
        .merge(routes::feed::router())
        .merge(routes::verify::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    let probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics));

    Router::new()
        .merge(uploads)
        .merge(api)
        .merge(probes)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the feed has loaded, 503 while it is loading
/// or after a failed load.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.feed.state() {
        LoadState::Idle => (StatusCode::OK, "ready".to_string()),
        LoadState::Loading => (StatusCode::SERVICE_UNAVAILABLE, "feed loading".to_string()),
        LoadState::Error(e) => {
            tracing::warn!(error = %e, "readiness: feed load failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("feed error: {e}"))
        }
    }
}

/// GET /metrics: Prometheus text exposition.
///
/// Domain gauges are refreshed from state on each scrape.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let Some(handle) = &state.metrics else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed".to_string());
    };

    metrics::gauge!("custody_ledger_head").set(state.ledger.head() as f64);
    metrics::gauge!("custody_feed_records").set(state.feed.len() as f64);
    match state.store.list() {
        Ok(names) => metrics::gauge!("custody_store_blobs").set(names.len() as f64),
        Err(e) => tracing::warn!(error = %e, "could not list content store"),
    }

    handle.run_upkeep();
    (StatusCode::OK, handle.render())
}
