//! Handler for internal storage statistics.

use std::net::IpAddr;

use axum::{Json, extract::State, http::HeaderMap};
use serde_json::json;

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the client address, set by the reverse proxy.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Returns link and user totals to callers inside the trusted subnet.
///
/// # Endpoint
///
/// `GET /api/internal/stats`
///
/// # Response Codes
///
/// - **200 OK**: `{ "urls": 42, "users": 7 }`
/// - **400 Bad Request**: `X-Real-IP` missing or not an IP address
/// - **403 Forbidden**: no trusted subnet configured, or the address is outside it
pub async fn internal_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let raw = headers
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    let ip: IpAddr = raw.parse().map_err(|_| {
        AppError::bad_request("X-Real-IP must be an IP address", json!({ "value": raw }))
    })?;

    let Some(subnet) = state.trusted_subnet else {
        return Err(AppError::forbidden("Internal statistics are disabled"));
    };

    if !subnet.contains(ip) {
        tracing::info!(%ip, %subnet, "Stats request from outside the trusted subnet");
        return Err(AppError::forbidden("Address is not in the trusted subnet"));
    }

    let stats = state.link_service.stats().await?;
    Ok(Json(stats.into()))
}
