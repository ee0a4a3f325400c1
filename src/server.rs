//! HTTP server initialization and runtime setup.
//!
//! Selects the storage backend, starts the deletion pipeline, serves HTTP until
//! a shutdown signal arrives, then drains the pipeline and closes storage.

use crate::application::services::LinkService;
use crate::config::{Config, StorageBackend};
use crate::domain::deletion_pipeline::DeletionPipeline;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::persistence::{MemoryLinkRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;

/// Opens the storage backend chosen by the configuration.
///
/// For PostgreSQL this connects the pool and applies pending migrations; for
/// the file backend it replays the snapshot.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, or the
/// snapshot file cannot be read.
pub async fn open_repository(config: &Config) -> Result<Arc<dyn LinkRepository>> {
    match config.storage_backend() {
        StorageBackend::Postgres(url) => {
            let pool = config
                .pg_pool_options()
                .connect(&url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to migrate")?;

            Ok(Arc::new(PgLinkRepository::new(Arc::new(pool))))
        }
        StorageBackend::File(path) => {
            let repository = MemoryLinkRepository::open(&path)
                .await
                .with_context(|| format!("Failed to open snapshot {}", path.display()))?;
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            tracing::warn!("No persistent storage configured, links live in memory only");
            Ok(Arc::new(MemoryLinkRepository::new()))
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// # Shutdown order
///
/// 1. SIGINT/SIGTERM stops accepting connections and in-flight requests finish
/// 2. The deletion pipeline flushes everything still queued
/// 3. The storage backend is closed
///
/// # Errors
///
/// Returns an error if storage cannot be opened, the bind fails, or the
/// server stops with an I/O error.
pub async fn run(config: Config) -> Result<()> {
    let repository = open_repository(&config).await?;

    let pipeline = DeletionPipeline::start(repository.clone(), config.pipeline_settings());

    let link_service = Arc::new(LinkService::new(
        repository.clone(),
        pipeline.sender(),
        config.base_url.clone(),
    ));
    let state = AppState::new(link_service, pipeline.sender())
        .with_trusted_subnet(config.trusted_subnet);

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining deletion pipeline");
    pipeline.shutdown().await;

    repository.close().await?;
    tracing::info!("Storage closed");

    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
