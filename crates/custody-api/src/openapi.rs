//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Custody API",
        version = "0.1.0",
        description = "Content-addressed file store, append-only evidence ledger, and reconciled verification feed."
    ),
    paths(
        crate::routes::files::upload,
        crate::routes::files::download,
        crate::routes::evidence::submit,
        crate::routes::evidence::submit_with_proof,
        crate::routes::evidence::count,
        crate::routes::evidence::get_record,
        crate::routes::chain::head,
        crate::routes::chain::events,
        crate::routes::feed::feed,
        crate::routes::verify::verify,
        crate::routes::verify::verify_file,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::PositionBody,
        crate::routes::EventBody,
        crate::routes::RecordBody,
        crate::routes::files::UploadResponse,
        crate::routes::evidence::SubmitRequest,
        crate::routes::evidence::SubmitWithProofRequest,
        crate::routes::evidence::CountResponse,
        crate::routes::chain::HeadResponse,
        crate::routes::chain::EventsResponse,
        crate::routes::feed::StateBody,
        crate::routes::feed::FeedResponse,
        crate::routes::verify::VerifyRequest,
        crate::routes::verify::VerifyResponse,
    )),
    tags(
        (name = "files", description = "Content store"),
        (name = "evidence", description = "Evidence ledger writes and reads"),
        (name = "chain", description = "Chain provider surface"),
        (name = "feed", description = "Reconciled feed"),
        (name = "verify", description = "File and hash verification"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/upload",
            "/files/{name}",
            "/v1/evidence",
            "/v1/evidence/proof",
            "/v1/evidence/{submitter}/count",
            "/v1/evidence/{submitter}/{index}",
            "/v1/chain/head",
            "/v1/chain/events",
            "/v1/feed",
            "/v1/verify",
            "/v1/verify/file",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
