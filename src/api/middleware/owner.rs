//! Caller identity extraction.
//!
//! Identity issuance and verification happen upstream; this service only reads
//! the already-verified owner id from a request header.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the caller's owner id.
pub const OWNER_HEADER: &str = "x-user-id";

/// Owner id of the current request.
///
/// Empty when the header is missing or not valid UTF-8; an empty owner can
/// create links but never list or delete them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        Ok(Owner(owner.to_string()))
    }
}
