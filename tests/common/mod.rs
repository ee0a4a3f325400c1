#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use link_shortener::application::services::LinkService;
use link_shortener::domain::deletion_pipeline::{DeletionPipeline, PipelineSettings};
use link_shortener::domain::repositories::LinkRepository;
use link_shortener::infrastructure::persistence::MemoryLinkRepository;
use link_shortener::routes::app_router;
use link_shortener::state::AppState;

pub const BASE_URL: &str = "http://short.test";

pub const FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Pipeline settings with a short timer so tests do not wait long.
pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        batch_size: 10,
        flush_interval: FLUSH_INTERVAL,
        queue_capacity: 100,
    }
}

/// Sleeps long enough for at least one timer-driven flush.
pub async fn wait_for_flush() {
    tokio::time::sleep(FLUSH_INTERVAL * 6).await;
}

pub fn create_test_state(repository: Arc<dyn LinkRepository>) -> (AppState, DeletionPipeline) {
    let pipeline = DeletionPipeline::start(repository.clone(), fast_settings());
    let link_service = Arc::new(LinkService::new(repository, pipeline.sender(), BASE_URL));
    let state = AppState::new(link_service, pipeline.sender());

    (state, pipeline)
}

/// Full router over a fresh in-memory store.
///
/// Keep the returned pipeline alive for as long as the server is used.
pub fn create_memory_server() -> (TestServer, DeletionPipeline) {
    create_server(Arc::new(MemoryLinkRepository::new()))
}

pub fn create_server(repository: Arc<dyn LinkRepository>) -> (TestServer, DeletionPipeline) {
    let (state, pipeline) = create_test_state(repository);
    let server = TestServer::new(app_router(state)).unwrap();

    (server, pipeline)
}

/// Router over a fresh in-memory store that trusts `subnet` for internal stats.
pub fn create_memory_server_trusting(subnet: &str) -> (TestServer, DeletionPipeline) {
    let (state, pipeline) = create_test_state(Arc::new(MemoryLinkRepository::new()));
    let state = state.with_trusted_subnet(Some(subnet.parse().unwrap()));
    let server = TestServer::new(app_router(state)).unwrap();

    (server, pipeline)
}

pub fn token_of(short_url: &str) -> &str {
    short_url.rsplit('/').next().unwrap()
}

pub async fn create_test_link(pool: &PgPool, token: &str, url: &str, owner: &str) {
    sqlx::query("INSERT INTO links (short_token, long_url, owner) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(url)
        .bind(owner)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_deleted_link(pool: &PgPool, token: &str, url: &str, owner: &str) {
    sqlx::query(
        "INSERT INTO links (short_token, long_url, owner, deleted) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(token)
    .bind(url)
    .bind(owner)
    .execute(pool)
    .await
    .unwrap();
}
