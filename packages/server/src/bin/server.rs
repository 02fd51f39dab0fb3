//! Discovery scheduler daemon.
//!
//! Connects to Postgres, runs migrations, wires the configured search
//! engines, and keeps the cron scheduler alive until interrupted.

use anyhow::{Context, Result};
use discovery_core::config::Config;
use discovery_core::kernel::scheduled_tasks::start_scheduler;
use discovery_core::kernel::DiscoveryDeps;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discovery_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Fundscout discovery server");

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let deps = DiscoveryDeps::from_config(&config, pool)?;
    let mut scheduler = start_scheduler(deps).await?;

    tracing::info!("Discovery server running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}
