//! DTOs for single-URL shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body of `POST /api/shorten`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

/// Response body of `POST /api/shorten`.
///
/// Sent with 201 for a new link and with 409 when the URL was already
/// shortened, in which case `result` is the existing short URL.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}
