//! In-memory link repository with an optional JSON-lines snapshot file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::snapshot::{self, SnapshotEntry, SnapshotWriter};
use crate::domain::entities::{
    DeleteSummary, DeletionRequest, LinkRecord, NewLink, StorageStats,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Link storage held in process memory.
///
/// All maps live behind a single mutex. When opened with a snapshot path, every
/// create and tombstone is appended to the file before it becomes visible, and
/// the file is replayed on startup.
pub struct MemoryLinkRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    links: HashMap<String, LinkRecord>,
    /// Long URL → token, for non-deleted records only.
    active_by_long_url: HashMap<String, String>,
    snapshot: Option<SnapshotWriter>,
}

impl MemoryState {
    fn insert(&mut self, record: LinkRecord) {
        if !record.deleted {
            self.active_by_long_url
                .entry(record.long_url.clone())
                .or_insert_with(|| record.token.clone());
        }
        self.links.insert(record.token.clone(), record);
    }

    fn mark_deleted(&mut self, token: &str) {
        let Some(record) = self.links.get_mut(token) else {
            return;
        };
        record.deleted = true;

        if self.active_by_long_url.get(&record.long_url).map(String::as_str) == Some(token) {
            self.active_by_long_url.remove(&record.long_url);
        }
    }

    /// First line for a token fixes its triple; a later tombstone line marks it deleted.
    fn apply_replayed(&mut self, entry: SnapshotEntry) {
        if let Some(existing) = self.links.get(&entry.token) {
            if entry.deleted && !existing.deleted {
                self.mark_deleted(&entry.token);
            }
            return;
        }

        let mut record = LinkRecord {
            token: entry.token,
            long_url: entry.long_url,
            owner: entry.owner,
            deleted: entry.deleted,
        };

        // Only one active token per long URL; later duplicates stay resolvable
        // as tombstones.
        if !record.deleted
            && let Some(active) = self.active_by_long_url.get(&record.long_url)
        {
            warn!(
                token = %record.token,
                active = %active,
                long_url = %record.long_url,
                "Duplicate active long URL in snapshot, treating later token as deleted"
            );
            record.deleted = true;
        }

        self.insert(record);
    }

    async fn persist(&mut self, entries: &[SnapshotEntry]) -> Result<(), AppError> {
        if let Some(writer) = self.snapshot.as_mut() {
            writer.append(entries).await?;
        }
        Ok(())
    }
}

impl MemoryLinkRepository {
    /// Creates an empty repository without persistence.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Opens a repository backed by the snapshot file at `path`.
    ///
    /// The file is replayed in full and then kept open for appends.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BackendUnavailable`] if the file cannot be read or opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let entries = snapshot::replay(path).await?;
        let replayed = entries.len();

        let mut state = MemoryState::default();
        for entry in entries {
            state.apply_replayed(entry);
        }

        info!(
            path = %path.display(),
            lines = replayed,
            links = state.links.len(),
            active = state.active_by_long_url.len(),
            "Snapshot replayed"
        );

        state.snapshot = Some(SnapshotWriter::open(path).await?);

        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Number of stored records, tombstoned ones included.
    pub async fn len(&self) -> usize {
        self.state.lock().await.links.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryLinkRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn token_conflict(token: &str) -> AppError {
    AppError::conflict("Short token already exists", json!({ "token": token }))
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<String, AppError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.active_by_long_url.get(&new_link.long_url) {
            return Err(AppError::AlreadyExists {
                existing: existing.clone(),
            });
        }

        if state.links.contains_key(&new_link.token) {
            return Err(token_conflict(&new_link.token));
        }

        state.persist(&[SnapshotEntry::from(&new_link)]).await?;

        let token = new_link.token.clone();
        state.insert(new_link.into());

        debug!(token = %token, "Link stored in memory");
        Ok(token)
    }

    async fn create_batch(&self, links: Vec<NewLink>) -> Result<Vec<String>, AppError> {
        let mut state = self.state.lock().await;

        let mut resolved = Vec::with_capacity(links.len());
        let mut pending: Vec<NewLink> = Vec::new();
        let mut pending_by_long_url: HashMap<String, String> = HashMap::new();
        let mut pending_tokens: HashSet<String> = HashSet::new();

        for link in links {
            let existing = state
                .active_by_long_url
                .get(&link.long_url)
                .or_else(|| pending_by_long_url.get(&link.long_url));
            if let Some(existing) = existing {
                resolved.push(existing.clone());
                continue;
            }

            if state.links.contains_key(&link.token) || !pending_tokens.insert(link.token.clone())
            {
                return Err(token_conflict(&link.token));
            }

            pending_by_long_url.insert(link.long_url.clone(), link.token.clone());
            resolved.push(link.token.clone());
            pending.push(link);
        }

        let entries: Vec<SnapshotEntry> = pending.iter().map(SnapshotEntry::from).collect();
        state.persist(&entries).await?;

        let created = pending.len();
        for link in pending {
            state.insert(link.into());
        }

        debug!(
            requested = resolved.len(),
            created, "Link batch stored in memory"
        );
        Ok(resolved)
    }

    async fn lookup(&self, token: &str) -> Result<String, AppError> {
        let state = self.state.lock().await;

        match state.links.get(token) {
            None => Err(AppError::not_found(
                "Short link not found",
                json!({ "token": token }),
            )),
            Some(record) if record.deleted => Err(AppError::Deleted {
                token: token.to_string(),
            }),
            Some(record) => Ok(record.long_url.clone()),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<HashMap<String, String>, AppError> {
        if owner.is_empty() {
            return Ok(HashMap::new());
        }

        let state = self.state.lock().await;

        Ok(state
            .links
            .values()
            .filter(|record| !record.deleted && record.owner == owner)
            .map(|record| (record.token.clone(), record.long_url.clone()))
            .collect())
    }

    async fn batch_delete(
        &self,
        requests: Vec<DeletionRequest>,
    ) -> Result<DeleteSummary, AppError> {
        let unique: HashSet<DeletionRequest> = requests.into_iter().collect();
        let requested = unique.len();

        let mut state = self.state.lock().await;

        let mut matched = 0;
        let mut tombstones = Vec::new();
        for request in &unique {
            match state.links.get(&request.token) {
                Some(record) if record.is_owned_by(&request.owner) => {
                    matched += 1;
                    if !record.deleted {
                        let mut entry = SnapshotEntry::from(record);
                        entry.deleted = true;
                        tombstones.push(entry);
                    }
                }
                _ => debug!(
                    token = %request.token,
                    owner = %request.owner,
                    "Skipping deletion: token unknown or not owned by requester"
                ),
            }
        }

        state.persist(&tombstones).await?;
        for entry in &tombstones {
            state.mark_deleted(&entry.token);
        }

        Ok(DeleteSummary::new(requested, matched))
    }

    async fn stats(&self) -> Result<StorageStats, AppError> {
        let state = self.state.lock().await;

        let users: HashSet<&str> = state
            .links
            .values()
            .map(|record| record.owner.as_str())
            .filter(|owner| !owner.is_empty())
            .collect();

        Ok(StorageStats {
            urls: state.links.len() as i64,
            users: users.len() as i64,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if let Some(writer) = state.snapshot.as_mut() {
            writer.sync().await?;
            info!(path = %writer.path().display(), "Snapshot file synced");
        }
        Ok(())
    }
}
