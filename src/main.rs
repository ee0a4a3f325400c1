use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use link_shortener::config::{Config, Overrides};
use link_shortener::server;

/// URL shortener with per-user links and batched asynchronous deletion.
#[derive(Parser, Debug)]
#[command(name = "link-shortener")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address to listen on, e.g. `0.0.0.0:8080` (overrides LISTEN)
    #[arg(short = 'a', long = "address")]
    listen_addr: Option<String>,

    /// Prefix of issued short URLs (overrides BASE_URL)
    #[arg(short = 'b', long = "base-url")]
    base_url: Option<String>,

    /// Snapshot file for the in-memory backend (overrides FILE_STORAGE_PATH)
    #[arg(short = 'f', long = "file")]
    file_storage_path: Option<PathBuf>,

    /// PostgreSQL connection string (overrides DATABASE_URL)
    #[arg(short = 'd', long = "database-url")]
    database_url: Option<String>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Overrides {
            listen_addr: cli.listen_addr,
            base_url: cli.base_url,
            file_storage_path: cli.file_storage_path,
            database_url: cli.database_url,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(cli.into());
    config.validate().context("Invalid configuration")?;

    init_tracing(&config);
    config.print_summary();

    server::run(config).await
}

/// Installs the global subscriber in text or JSON format.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

