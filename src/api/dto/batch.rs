//! DTOs for the batch shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{BatchItem, BatchResult};

/// One element of the `POST /api/shorten/batch` request array.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequestItem {
    /// Caller-chosen identifier echoed back in the response.
    #[validate(length(min = 1, message = "correlation_id must not be empty"))]
    pub correlation_id: String,

    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,
}

impl From<BatchRequestItem> for BatchItem {
    fn from(item: BatchRequestItem) -> Self {
        BatchItem {
            correlation_id: item.correlation_id,
            long_url: item.original_url,
        }
    }
}

/// One element of the batch response array.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}

impl From<BatchResult> for BatchResponseItem {
    fn from(result: BatchResult) -> Self {
        Self {
            correlation_id: result.correlation_id,
            short_url: result.short_url,
        }
    }
}
