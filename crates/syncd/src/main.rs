//! Solarsync scheduler daemon binary.
//!
//! Fires the daily Growatt pull on a cron schedule until interrupted.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syncd::{SchedulerConfig, SyncScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,syncd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    tracing::info!("Starting Solarsync scheduler daemon");

    let config = SchedulerConfig::from_env()?;
    tracing::info!(
        cron = %config.cron,
        run_on_start = config.run_on_start,
        "Daemon configuration loaded"
    );

    if config.run_on_start {
        syncd::runner::run_once().await;
    }

    let mut scheduler = SyncScheduler::new(&config).await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");

    scheduler.shutdown().await?;

    tracing::info!("Daemon stopped");
    Ok(())
}
