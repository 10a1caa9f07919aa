use anyhow::{Context, Result};
use bok_tone::{cli, config::Config, db::Database};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Load configuration first
    let config = Config::load()?;

    // Initialize tracing with structured JSON logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "bok-tone starting up");

    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!("Failed to create data directory {}", config.storage.data_dir.display())
    })?;

    // Initialize database
    let db = Database::new(&config.database.url, config.database.max_connections).await?;
    // Run migrations and verify connectivity
    db.run_migrations().await?;
    db.health_check().await?;
    info!("{}", db.pool_stats());

    cli::run(cli, db.pool.clone(), config).await?;

    db.close().await;
    info!("bok-tone completed successfully");
    Ok(())
}
