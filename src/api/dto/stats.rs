//! DTO for the internal statistics endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::entities::StorageStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub urls: i64,
    pub users: i64,
}

impl From<StorageStats> for StatsResponse {
    fn from(stats: StorageStats) -> Self {
        Self {
            urls: stats.urls,
            users: stats.users,
        }
    }
}
