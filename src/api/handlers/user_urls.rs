//! Handlers for the calling user's links.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::user_urls::UserUrl;
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's active links.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response Codes
///
/// - **200 OK**: `[{ "short_url", "original_url" }]`, sorted by short URL
/// - **204 No Content**: the caller has no active links
pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Response, AppError> {
    if owner.is_anonymous() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let links = state.link_service.list_by_owner(owner.as_str()).await?;

    if links.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let mut urls: Vec<UserUrl> = links
        .into_iter()
        .map(|(short_url, original_url)| UserUrl {
            short_url,
            original_url,
        })
        .collect();
    urls.sort_by(|a, b| a.short_url.cmp(&b.short_url));

    Ok(Json(urls).into_response())
}

/// Schedules deletion of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// A JSON array of tokens or full short URLs:
///
/// ```json
/// ["aB3dE5gH7j", "http://localhost:8080/K9mN1pQ3rS"]
/// ```
///
/// Always answers 202 Accepted once the tokens are queued. Tokens that are
/// unknown or belong to someone else are skipped later without notice.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    owner: Owner,
    Json(tokens): Json<Vec<String>>,
) -> Result<StatusCode, AppError> {
    state
        .link_service
        .request_deletion(owner.as_str(), &tokens)
        .await?;

    Ok(StatusCode::ACCEPTED)
}
