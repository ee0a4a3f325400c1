//! API route configuration.
//!
//! User routes read the caller's identity from the `X-User-Id` header via the
//! [`crate::api::middleware::Owner`] extractor.

use crate::api::handlers::{
    delete_user_urls_handler, internal_stats_handler, list_user_urls_handler,
    shorten_batch_handler, shorten_json_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get, routing::post};

/// Routes nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /shorten`        - Shorten one URL (JSON)
/// - `POST   /shorten/batch`  - Shorten many URLs in one call
/// - `GET    /user/urls`      - List the caller's links
/// - `DELETE /user/urls`      - Queue the caller's links for deletion
/// - `GET    /internal/stats` - Link and user totals, trusted subnet only
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_json_handler))
        .route("/shorten/batch", post(shorten_batch_handler))
        .route(
            "/user/urls",
            get(list_user_urls_handler).delete(delete_user_urls_handler),
        )
        .route("/internal/stats", get(internal_stats_handler))
}
