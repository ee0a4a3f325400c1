//! Handler for batch shortening.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::batch::{BatchRequestItem, BatchResponseItem};
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens many URLs in one request.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [
///   { "correlation_id": "1", "original_url": "https://example.com/a" },
///   { "correlation_id": "2", "original_url": "https://example.com/b" }
/// ]
/// ```
///
/// # Response
///
/// 201 with one `{ "correlation_id", "short_url" }` per input item, in input
/// order. URLs that were already shortened get their existing short URL.
///
/// # Errors
///
/// Returns 400 if the array is empty or any item is invalid; nothing is stored.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    owner: Owner,
    Json(payload): Json<Vec<BatchRequestItem>>,
) -> Result<(StatusCode, Json<Vec<BatchResponseItem>>), AppError> {
    for item in &payload {
        item.validate()?;
    }

    let items = payload.into_iter().map(Into::into).collect();
    let results = state
        .link_service
        .shorten_batch(items, owner.as_str())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(results.into_iter().map(Into::into).collect()),
    ))
}
