//! CLI administration tool for link-shortener.
//!
//! Works directly against the configured storage backend, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check storage connectivity
//! cargo run --bin admin -- db check
//!
//! # List the links of one user
//! cargo run --bin admin -- links list --owner user-42
//!
//! # Resolve a token or short URL
//! cargo run --bin admin -- links resolve aB3dE5gH7j
//!
//! # Delete links on behalf of their owner
//! cargo run --bin admin -- links delete --owner user-42 aB3dE5gH7j K9mN1pQ3rS
//! ```
//!
//! # Environment Variables
//!
//! The same as the server: `DATABASE_URL` (or `DB_*`) selects PostgreSQL,
//! otherwise `FILE_STORAGE_PATH` selects the snapshot file.

use link_shortener::application::services::LinkService;
use link_shortener::config::{Config, Overrides, StorageBackend, mask_connection_string};
use link_shortener::domain::deletion_pipeline::DeletionPipeline;
use link_shortener::domain::repositories::LinkRepository;
use link_shortener::error::AppError;
use link_shortener::server::open_repository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing link-shortener storage.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PostgreSQL connection string (overrides DATABASE_URL)
    #[arg(short = 'd', long = "database-url", global = true)]
    database_url: Option<String>,

    /// Snapshot file of the in-memory backend (overrides FILE_STORAGE_PATH)
    #[arg(short = 'f', long = "file", global = true)]
    file_storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show statistics
    Stats,

    /// Storage operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Inspect and delete links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },
}

/// Storage diagnostic subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check storage connectivity
    Check,
}

/// Link subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// List the active links of a user
    List {
        #[arg(short, long)]
        owner: String,
    },

    /// Show the long URL behind a token or short URL
    Resolve { token: String },

    /// Delete links on behalf of their owner
    Delete {
        #[arg(short, long)]
        owner: String,

        /// Tokens or short URLs
        #[arg(required = true)]
        tokens: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(Overrides {
        database_url: cli.database_url,
        file_storage_path: cli.file_storage_path,
        ..Overrides::default()
    });
    config.validate().context("Invalid configuration")?;

    if config.storage_backend() == StorageBackend::Memory {
        println!(
            "{}",
            "⚠️  No DATABASE_URL or FILE_STORAGE_PATH configured; working on an empty in-memory store"
                .yellow()
        );
    }

    let repository = open_repository(&config).await?;

    let result = match cli.command {
        Commands::Stats => handle_stats(repository.as_ref()).await,
        Commands::Db { action } => handle_db_action(action, &config, repository.as_ref()).await,
        Commands::Links { action } => handle_link_action(action, &config, repository.clone()).await,
    };

    repository
        .close()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to close storage: {}", e))?;

    result
}

/// Displays storage statistics.
async fn handle_stats(repository: &dyn LinkRepository) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let stats = repository
        .stats()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    println!(
        "  Links: {}",
        stats.urls.to_string().bright_green().bold()
    );
    println!(
        "  Users: {}",
        stats.users.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles storage diagnostic commands.
async fn handle_db_action(
    action: DbAction,
    config: &Config,
    repository: &dyn LinkRepository,
) -> Result<()> {
    match action {
        DbAction::Check => {
            let target = match config.storage_backend() {
                StorageBackend::Postgres(url) => mask_connection_string(&url),
                StorageBackend::File(path) => path.display().to_string(),
                StorageBackend::Memory => "memory".to_string(),
            };
            println!(
                "{} {}",
                "🔍 Checking storage:".bright_blue(),
                target.bright_white()
            );

            repository
                .ping()
                .await
                .map_err(|e| anyhow::anyhow!("Storage check failed: {}", e))?;

            println!("{}", "✅ Storage OK".green().bold());
        }
    }

    Ok(())
}

/// Dispatches link commands.
async fn handle_link_action(
    action: LinkAction,
    config: &Config,
    repository: Arc<dyn LinkRepository>,
) -> Result<()> {
    let pipeline = DeletionPipeline::start(repository.clone(), config.pipeline_settings());
    let service = LinkService::new(repository, pipeline.sender(), config.base_url.clone());

    let result = match action {
        LinkAction::List { owner } => list_links(&service, &owner).await,
        LinkAction::Resolve { token } => resolve_link(&service, &token).await,
        LinkAction::Delete { owner, tokens, yes } => {
            delete_links(&service, &owner, &tokens, yes).await
        }
    };

    // Final flush of anything queued by `delete`.
    pipeline.shutdown().await;

    result
}

/// Lists a user's active links sorted by short URL.
async fn list_links(service: &LinkService, owner: &str) -> Result<()> {
    println!(
        "{} {}",
        "📋 Links of".bright_blue().bold(),
        owner.cyan().bold()
    );
    println!();

    let links = service
        .list_by_owner(owner)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    let mut links: Vec<_> = links.into_iter().collect();
    links.sort();

    println!(
        "  {:<40} {}",
        "Short URL".bright_white().bold(),
        "Original URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for (short_url, long_url) in &links {
        println!("  {:<40} {}", short_url.cyan(), long_url);
    }

    println!();
    println!(
        "  Total: {}",
        links.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Prints the long URL behind a token, or why there is none.
async fn resolve_link(service: &LinkService, token: &str) -> Result<()> {
    match service.resolve(token).await {
        Ok(long_url) => {
            println!("  {} → {}", token.cyan(), long_url.bright_white());
        }
        Err(AppError::Deleted { .. }) => {
            println!("  {} {}", token.cyan(), "DELETED".red().bold());
        }
        Err(AppError::NotFound { .. }) => {
            println!("  {} {}", token.cyan(), "NOT FOUND".yellow().bold());
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to resolve: {}", e)),
    }

    Ok(())
}

/// Queues deletion of `tokens` for `owner`, after confirmation.
///
/// Tokens owned by someone else are skipped silently, as through the API.
async fn delete_links(
    service: &LinkService,
    owner: &str,
    tokens: &[String],
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🗑️  Delete links".bright_blue().bold());
    println!();
    println!("  Owner:  {}", owner.cyan());
    println!("  Tokens: {}", tokens.len().to_string().bright_white());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete these links?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service
        .request_deletion(owner, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to queue deletion: {}", e))?;

    println!(
        "{}",
        "✅ Deletion queued; links owned by someone else are left untouched"
            .green()
            .bold()
    );
    println!();

    Ok(())
}
