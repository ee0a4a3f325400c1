//! PostgreSQL implementation of the link repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::domain::entities::{
    DeleteSummary, DeletionRequest, NewLink, StorageStats,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::{LONG_URL_CONSTRAINT, TOKEN_CONSTRAINT, is_unique_violation_on};

/// PostgreSQL repository for link storage.
///
/// Deduplication on the long URL is enforced by the partial unique index
/// `links_long_url_active_idx`, so two concurrent creates for the same URL
/// cannot both succeed.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn find_active_token(&self, long_url: &str) -> Result<Option<String>, AppError> {
        let token = sqlx::query_scalar::<_, String>(
            "SELECT short_token FROM links WHERE long_url = $1 AND NOT deleted",
        )
        .bind(long_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(token)
    }
}

fn token_conflict(token: &str) -> AppError {
    AppError::conflict("Short token already exists", json!({ "token": token }))
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<String, AppError> {
        let result = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO links (short_token, long_url, owner)
            VALUES ($1, $2, $3)
            RETURNING short_token
            "#,
        )
        .bind(&new_link.token)
        .bind(&new_link.long_url)
        .bind(&new_link.owner)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(token) => Ok(token),
            Err(e) if is_unique_violation_on(&e, LONG_URL_CONSTRAINT) => {
                match self.find_active_token(&new_link.long_url).await? {
                    Some(existing) => Err(AppError::AlreadyExists { existing }),
                    // The active row was tombstoned between the insert and the lookup.
                    None => Err(AppError::conflict(
                        "Long URL changed concurrently",
                        json!({ "long_url": new_link.long_url }),
                    )),
                }
            }
            Err(e) if is_unique_violation_on(&e, TOKEN_CONSTRAINT) => {
                Err(token_conflict(&new_link.token))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_batch(&self, links: Vec<NewLink>) -> Result<Vec<String>, AppError> {
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let long_urls: Vec<String> = links.iter().map(|l| l.long_url.clone()).collect();

        let mut tx = self.pool.begin().await?;

        let mut by_long_url: HashMap<String, String> = sqlx::query_as::<_, (String, String)>(
            "SELECT long_url, short_token FROM links WHERE long_url = ANY($1) AND NOT deleted",
        )
        .bind(&long_urls)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut tokens = Vec::new();
        let mut urls = Vec::new();
        let mut owners = Vec::new();
        let mut seen_tokens = HashSet::new();
        for link in &links {
            if by_long_url.contains_key(&link.long_url) {
                continue;
            }
            if !seen_tokens.insert(link.token.as_str()) {
                return Err(token_conflict(&link.token));
            }
            by_long_url.insert(link.long_url.clone(), link.token.clone());
            tokens.push(link.token.clone());
            urls.push(link.long_url.clone());
            owners.push(link.owner.clone());
        }

        let inserted: HashSet<String> = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO links (short_token, long_url, owner)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[])
            ON CONFLICT DO NOTHING
            RETURNING short_token
            "#,
        )
        .bind(&tokens)
        .bind(&urls)
        .bind(&owners)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        if let Some(token) = tokens.iter().find(|t| !inserted.contains(*t)) {
            // Dropping `tx` rolls the batch back.
            return Err(token_conflict(token));
        }

        tx.commit().await?;

        debug!(
            requested = links.len(),
            created = inserted.len(),
            "Link batch stored"
        );

        Ok(links
            .iter()
            .map(|link| {
                by_long_url
                    .get(&link.long_url)
                    .cloned()
                    .unwrap_or_else(|| link.token.clone())
            })
            .collect())
    }

    async fn lookup(&self, token: &str) -> Result<String, AppError> {
        let row = sqlx::query_as::<_, (String, bool)>(
            "SELECT long_url, deleted FROM links WHERE short_token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            None => Err(AppError::not_found(
                "Short link not found",
                json!({ "token": token }),
            )),
            Some((_, true)) => Err(AppError::Deleted {
                token: token.to_string(),
            }),
            Some((long_url, false)) => Ok(long_url),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<HashMap<String, String>, AppError> {
        if owner.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT short_token, long_url
            FROM links
            WHERE owner = $1 AND NOT deleted
            "#,
        )
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn batch_delete(
        &self,
        requests: Vec<DeletionRequest>,
    ) -> Result<DeleteSummary, AppError> {
        let unique: HashSet<DeletionRequest> = requests.into_iter().collect();
        let requested = unique.len();

        let (tokens, owners): (Vec<String>, Vec<String>) = unique
            .into_iter()
            .filter(|r| !r.owner.is_empty())
            .map(|r| (r.token, r.owner))
            .unzip();

        if tokens.is_empty() {
            return Ok(DeleteSummary::new(requested, 0));
        }

        let updated = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE links
            SET deleted = TRUE
            FROM UNNEST($1::text[], $2::text[]) AS d(token, owner)
            WHERE links.short_token = d.token AND links.owner = d.owner
            RETURNING links.short_token
            "#,
        )
        .bind(&tokens)
        .bind(&owners)
        .fetch_all(self.pool.as_ref())
        .await?;

        let summary = DeleteSummary::new(requested, updated.len());
        if summary.skipped > 0 {
            debug!(
                skipped = summary.skipped,
                "Some deletion requests matched no owned link"
            );
        }

        Ok(summary)
    }

    async fn stats(&self) -> Result<StorageStats, AppError> {
        let (urls, users) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(DISTINCT NULLIF(owner, '')) FROM links",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(StorageStats { urls, users })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| {
                warn!(error = %e, "Database ping failed");
                AppError::unavailable(e.to_string())
            })?;

        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        self.pool.close().await;
        Ok(())
    }
}
