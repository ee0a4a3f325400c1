//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short token to its original URL.
///
/// # Endpoint
///
/// `GET /{token}`
///
/// # Errors
///
/// - 404 Not Found if the token was never issued
/// - 410 Gone if the link has been deleted by its owner
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&token).await?;

    debug!(token = %token, "Redirecting");
    Ok(Redirect::temporary(&long_url))
}
