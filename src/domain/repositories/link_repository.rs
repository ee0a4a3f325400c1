//! Repository trait for short link storage.

use std::collections::HashMap;

use crate::domain::entities::{DeleteSummary, DeletionRequest, NewLink, StorageStats};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage contract implemented by every link backend.
///
/// The Link Service and the deletion pipeline depend only on this trait, so a
/// backend is chosen once at startup and shared as `Arc<dyn LinkRepository>`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-memory maps with optional JSON-lines snapshot
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Stores a new mapping, deduplicating on the long URL.
    ///
    /// Returns the stored token on success.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AlreadyExists`] carrying the existing token if the long
    /// URL already has an active mapping; no row is written in that case.
    ///
    /// Returns [`AppError::Conflict`] if the generated token is already taken.
    async fn create(&self, new_link: NewLink) -> Result<String, AppError>;

    /// Stores several mappings in one backend operation.
    ///
    /// The result is aligned with the input: for each item, the token of the
    /// existing active mapping if the long URL was already shortened (including
    /// earlier in the same batch), otherwise the item's own token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a generated token collides; nothing from
    /// the batch is kept in that case.
    async fn create_batch(&self, links: Vec<NewLink>) -> Result<Vec<String>, AppError>;

    /// Resolves a token to its long URL.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no row has this token
    /// - [`AppError::Deleted`] if the row is tombstoned
    async fn lookup(&self, token: &str) -> Result<String, AppError>;

    /// Lists the active mappings of `owner` as token → long URL.
    ///
    /// Returns an empty map (not an error) when the owner has nothing, and for
    /// the empty owner.
    async fn list_by_owner(&self, owner: &str) -> Result<HashMap<String, String>, AppError>;

    /// Tombstones every record whose token and owner both match a request.
    ///
    /// Mismatches are skipped and only reported through the summary. Partial
    /// application under error is acceptable.
    async fn batch_delete(&self, requests: Vec<DeletionRequest>)
    -> Result<DeleteSummary, AppError>;

    /// Returns aggregate counters.
    async fn stats(&self) -> Result<StorageStats, AppError>;

    /// Liveness check without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BackendUnavailable`] when the backend cannot be reached.
    async fn ping(&self) -> Result<(), AppError>;

    /// Releases connections and file handles.
    async fn close(&self) -> Result<(), AppError>;
}
