//! Link shortening, resolution and deletion orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::deletion_pipeline::DeletionSender;
use crate::domain::entities::{NewLink, StorageStats};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::token_generator::{compose_short_url, extract_token, generate_token};
use crate::utils::url_validator::validate_long_url;

/// Attempts at finding a free token before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 10;

/// One entry of a batch shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub correlation_id: String,
    pub long_url: String,
}

/// One entry of a batch shorten result, aligned with the request by `correlation_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_url: String,
}

/// Service combining token generation, the storage backend and the deletion
/// pipeline behind one interface.
///
/// Short URLs are composed here from the configured base URL; the backend only
/// ever sees bare tokens.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    deletions: DeletionSender,
    base_url: String,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        deletions: DeletionSender,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            deletions,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full short URL for a bare token.
    pub fn short_url(&self, token: &str) -> String {
        compose_short_url(&self.base_url, token)
    }

    /// Shortens `long_url` on behalf of `owner`.
    ///
    /// Token collisions are retried with a fresh token up to
    /// [`MAX_TOKEN_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the URL is not an absolute HTTP(S) URL
    /// - [`AppError::AlreadyExists`] with the existing short URL if `long_url`
    ///   already has an active mapping; callers treat this as a success
    /// - [`AppError::Internal`] if no free token was found
    pub async fn shorten(&self, long_url: &str, owner: &str) -> Result<String, AppError> {
        validate_url(long_url)?;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let new_link = NewLink::new(generate_token(), long_url, owner);

            match self.repository.create(new_link).await {
                Ok(token) => {
                    info!(token = %token, owner, "Short link created");
                    return Ok(self.short_url(&token));
                }
                Err(AppError::AlreadyExists { existing }) => {
                    debug!(token = %existing, "Long URL already shortened");
                    return Err(AppError::AlreadyExists {
                        existing: self.short_url(&existing),
                    });
                }
                Err(AppError::Conflict { .. }) => {
                    warn!(attempt, "Token collision, retrying with a fresh token");
                }
                Err(e) => return Err(e),
            }
        }

        Err(too_many_collisions())
    }

    /// Shortens several URLs in one backend operation.
    ///
    /// Each result carries the short URL of the existing mapping when the long
    /// URL was already shortened, including earlier in the same batch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the batch is empty or any URL is
    /// invalid; nothing is stored in that case.
    pub async fn shorten_batch(
        &self,
        items: Vec<BatchItem>,
        owner: &str,
    ) -> Result<Vec<BatchResult>, AppError> {
        if items.is_empty() {
            return Err(AppError::bad_request("Batch must not be empty", json!({})));
        }

        for item in &items {
            validate_url(&item.long_url).map_err(|e| match e {
                AppError::Validation { message, .. } => AppError::bad_request(
                    message,
                    json!({ "correlation_id": item.correlation_id }),
                ),
                other => other,
            })?;
        }

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let links = items
                .iter()
                .map(|item| NewLink::new(generate_token(), item.long_url.as_str(), owner))
                .collect();

            match self.repository.create_batch(links).await {
                Ok(tokens) => {
                    info!(count = tokens.len(), owner, "Link batch shortened");
                    return Ok(items
                        .into_iter()
                        .zip(tokens)
                        .map(|(item, token)| BatchResult {
                            correlation_id: item.correlation_id,
                            short_url: self.short_url(&token),
                        })
                        .collect());
                }
                Err(AppError::Conflict { .. }) => {
                    warn!(attempt, "Token collision in batch, retrying with fresh tokens");
                }
                Err(e) => return Err(e),
            }
        }

        Err(too_many_collisions())
    }

    /// Resolves a bare token or a full short URL to its long URL.
    ///
    /// # Errors
    ///
    /// Propagates [`AppError::NotFound`] and [`AppError::Deleted`] unchanged.
    pub async fn resolve(&self, short: &str) -> Result<String, AppError> {
        let token = extract_token(&self.base_url, short);
        self.repository.lookup(token).await
    }

    /// Lists the active links of `owner` as short URL → long URL.
    pub async fn list_by_owner(&self, owner: &str) -> Result<HashMap<String, String>, AppError> {
        let links = self.repository.list_by_owner(owner).await?;

        Ok(links
            .into_iter()
            .map(|(token, long_url)| (self.short_url(&token), long_url))
            .collect())
    }

    /// Schedules tombstoning of `tokens` on behalf of `owner`.
    ///
    /// Returns once the tokens are queued; the backend is updated later by the
    /// deletion pipeline and failures there are not reported back.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BackendUnavailable`] if the pipeline has shut down.
    pub async fn request_deletion<S: AsRef<str>>(
        &self,
        owner: &str,
        tokens: &[S],
    ) -> Result<(), AppError> {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|t| extract_token(&self.base_url, t.as_ref()))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        debug!(owner, count = tokens.len(), "Deletion requested");
        self.deletions.submit(owner, tokens).await
    }

    /// Checks that the storage backend is reachable.
    ///
    /// # Errors
    ///
    /// Any backend failure is reported as [`AppError::BackendUnavailable`].
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await.map_err(|e| match e {
            AppError::BackendUnavailable { .. } => e,
            other => AppError::unavailable(other.to_string()),
        })
    }

    pub async fn stats(&self) -> Result<StorageStats, AppError> {
        self.repository.stats().await
    }
}

fn validate_url(long_url: &str) -> Result<(), AppError> {
    validate_long_url(long_url).map_err(|e| {
        AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
    })
}

fn too_many_collisions() -> AppError {
    AppError::internal(
        "Failed to generate unique token",
        json!({ "reason": "Too many collisions" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deletion_pipeline::{DeletionPipeline, PipelineSettings};
    use crate::domain::entities::{DeleteSummary, DeletionRequest};
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::persistence::MemoryLinkRepository;
    use std::sync::Mutex;
    use std::time::Duration;

    const BASE: &str = "http://localhost:8080";

    fn service_with(repo: MockLinkRepository) -> (LinkService, DeletionPipeline) {
        let repo: Arc<dyn LinkRepository> = Arc::new(repo);
        let pipeline = DeletionPipeline::start(repo.clone(), PipelineSettings::default());
        let service = LinkService::new(repo, pipeline.sender(), BASE);
        (service, pipeline)
    }

    fn memory_service() -> (LinkService, DeletionPipeline) {
        let repo: Arc<dyn LinkRepository> = Arc::new(MemoryLinkRepository::new());
        let pipeline = DeletionPipeline::start(repo.clone(), PipelineSettings::default());
        let service = LinkService::new(repo, pipeline.sender(), BASE);
        (service, pipeline)
    }

    fn token_of(short_url: &str) -> &str {
        short_url.rsplit('/').next().unwrap()
    }

    #[tokio::test]
    async fn test_shorten_returns_short_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .withf(|link| link.long_url == "https://example.com" && link.owner == "u1")
            .times(1)
            .returning(|link| Ok(link.token));

        let (service, _pipeline) = service_with(repo);

        let short = service.shorten("https://example.com", "u1").await.unwrap();

        assert!(short.starts_with("http://localhost:8080/"));
        assert_eq!(token_of(&short).len(), 10);
    }

    #[tokio::test]
    async fn test_shorten_rewrites_already_exists_with_short_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().times(1).returning(|_| {
            Err(AppError::AlreadyExists {
                existing: "existing01".to_string(),
            })
        });

        let (service, _pipeline) = service_with(repo);

        let err = service
            .shorten("https://example.com", "u1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::AlreadyExists { ref existing } if existing == "http://localhost:8080/existing01"
        ));
    }

    #[tokio::test]
    async fn test_shorten_retries_on_token_collision() {
        let mut repo = MockLinkRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::conflict("Short token already exists", json!({}))));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|link| Ok(link.token));

        let (service, _pipeline) = service_with(repo);

        assert!(service.shorten("https://example.com", "u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_shorten_gives_up_after_max_attempts() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .times(MAX_TOKEN_ATTEMPTS)
            .returning(|_| Err(AppError::conflict("Short token already exists", json!({}))));

        let (service, _pipeline) = service_with(repo);

        let err = service
            .shorten("https://example.com", "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_shorten_rejects_invalid_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().times(0);

        let (service, _pipeline) = service_with(repo);

        for url in ["not-a-url", "javascript:alert(1)", ""] {
            let err = service.shorten(url, "u1").await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "{url}");
        }
    }

    #[tokio::test]
    async fn test_shorten_does_not_mask_backend_errors() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::unavailable("connection refused")));

        let (service, _pipeline) = service_with(repo);

        let err = service
            .shorten("https://example.com", "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_resolve_accepts_full_short_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_lookup()
            .withf(|token| token == "abcdefghij")
            .times(2)
            .returning(|_| Ok("https://example.com".to_string()));

        let (service, _pipeline) = service_with(repo);

        assert_eq!(
            service
                .resolve("http://localhost:8080/abcdefghij")
                .await
                .unwrap(),
            "https://example.com"
        );
        assert_eq!(
            service.resolve("abcdefghij").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_ping_maps_failures_to_backend_unavailable() {
        let mut repo = MockLinkRepository::new();
        repo.expect_ping()
            .times(1)
            .returning(|| Err(AppError::internal("boom", json!({}))));

        let (service, _pipeline) = service_with(repo);

        assert!(matches!(
            service.ping().await,
            Err(AppError::BackendUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_shorten_batch_keeps_correlation_ids() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create_batch()
            .withf(|links| links.len() == 2 && links.iter().all(|l| l.owner == "u1"))
            .times(1)
            .returning(|links| Ok(links.into_iter().map(|l| l.token).collect()));

        let (service, _pipeline) = service_with(repo);

        let results = service
            .shorten_batch(
                vec![
                    BatchItem {
                        correlation_id: "1".to_string(),
                        long_url: "https://a.example.com".to_string(),
                    },
                    BatchItem {
                        correlation_id: "2".to_string(),
                        long_url: "https://b.example.com".to_string(),
                    },
                ],
                "u1",
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].correlation_id, "1");
        assert_eq!(results[1].correlation_id, "2");
        assert!(results[0].short_url.starts_with("http://localhost:8080/"));
    }

    #[tokio::test]
    async fn test_shorten_batch_rejects_empty_and_invalid() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create_batch().times(0);

        let (service, _pipeline) = service_with(repo);

        assert!(matches!(
            service.shorten_batch(Vec::new(), "u1").await,
            Err(AppError::Validation { .. })
        ));

        let err = service
            .shorten_batch(
                vec![BatchItem {
                    correlation_id: "x".to_string(),
                    long_url: "ftp://example.com".to_string(),
                }],
                "u1",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation { ref details, .. } if details["correlation_id"] == "x"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deletion_enqueues_bare_tokens() {
        let calls: Arc<Mutex<Vec<Vec<DeletionRequest>>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_batch_delete().returning(move |batch| {
            let summary = DeleteSummary::new(batch.len(), batch.len());
            recorded.lock().unwrap().push(batch);
            Ok(summary)
        });

        let (service, pipeline) = service_with(repo);

        service
            .request_deletion("u1", &["http://localhost:8080/tok1", "tok2", "  "])
            .await
            .unwrap();
        pipeline.shutdown().await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                DeletionRequest::new("tok1", "u1"),
                DeletionRequest::new("tok2", "u1"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deletion_after_shutdown_fails() {
        let (service, pipeline) = service_with(MockLinkRepository::new());
        pipeline.shutdown().await;

        assert!(matches!(
            service.request_deletion("u1", &["tok1"]).await,
            Err(AppError::BackendUnavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shorten_twice_then_delete_by_owner() {
        let (service, _pipeline) = memory_service();

        let first = service.shorten("https://example.com/a", "u1").await.unwrap();
        let second = service
            .shorten("https://example.com/a", "u1")
            .await
            .unwrap_err();
        assert!(matches!(second, AppError::AlreadyExists { ref existing } if *existing == first));

        service.request_deletion("u1", &[&first]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(matches!(
            service.resolve(&first).await,
            Err(AppError::Deleted { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_by_other_owner_leaves_link_intact() {
        let (service, _pipeline) = memory_service();

        let short = service.shorten("https://example.com/b", "u2").await.unwrap();

        service.request_deletion("u1", &[&short]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(
            service.resolve(&short).await.unwrap(),
            "https://example.com/b"
        );
    }

    #[tokio::test]
    async fn test_list_by_owner_returns_short_urls() {
        let (service, _pipeline) = memory_service();

        let short = service.shorten("https://example.com/c", "u3").await.unwrap();

        let links = service.list_by_owner("u3").await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[&short], "https://example.com/c");
        assert!(service.list_by_owner("u4").await.unwrap().is_empty());
    }
}
