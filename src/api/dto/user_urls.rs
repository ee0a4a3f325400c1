//! DTOs for the per-user link endpoints.

use serde::{Deserialize, Serialize};

/// One active link of the calling user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}
