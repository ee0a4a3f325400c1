//! Deletion request model for the asynchronous tombstone pipeline.

/// A single token scheduled for soft-deletion on behalf of `owner`.
///
/// Lives only in the pipeline buffer between enqueue and flush.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeletionRequest {
    pub token: String,
    pub owner: String,
}

impl DeletionRequest {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
        }
    }
}

/// Result of applying one batch of deletion requests.
///
/// `skipped` counts requests that matched no record owned by the requester
/// (unknown token, different owner, or empty owner).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub requested: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl DeleteSummary {
    pub fn new(requested: usize, deleted: usize) -> Self {
        Self {
            requested,
            deleted,
            skipped: requested.saturating_sub(deleted),
        }
    }
}
