//! Handlers for single-URL shortening.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL sent as the plain-text request body.
///
/// # Endpoint
///
/// `POST /`
///
/// # Response Codes
///
/// - **201 Created**: body is the new short URL
/// - **409 Conflict**: the URL was already shortened; body is the existing short URL
/// - **400 Bad Request**: body is not an absolute HTTP(S) URL
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    owner: Owner,
    body: String,
) -> Result<Response, AppError> {
    let long_url = body.trim();
    if long_url.is_empty() {
        return Err(AppError::bad_request(
            "Request body must contain a URL",
            json!({}),
        ));
    }

    match state.link_service.shorten(long_url, owner.as_str()).await {
        Ok(short_url) => Ok((StatusCode::CREATED, short_url).into_response()),
        Err(AppError::AlreadyExists { existing }) => {
            Ok((StatusCode::CONFLICT, existing).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Shortens a URL sent as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/aB3dE5gH7j" }
/// ```
///
/// Returned with 201 for a new link and 409 when the URL was already shortened.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    owner: Owner,
    Json(payload): Json<ShortenRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let (status, result) = match state.link_service.shorten(&payload.url, owner.as_str()).await {
        Ok(short_url) => (StatusCode::CREATED, short_url),
        Err(AppError::AlreadyExists { existing }) => (StatusCode::CONFLICT, existing),
        Err(e) => return Err(e),
    };

    Ok((status, Json(ShortenResponse { result })).into_response())
}
