//! Scheduled execution of the daily sync.
//!
//! Every tick fires one fully isolated run: a fresh run id, a fresh config
//! load, and fresh client and store handles. Nothing is shared between
//! runs, so an overlapping manual dispatch cannot interfere.

use anyhow::{anyhow, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use solar_tools::jobs::daily;
use solar_tools::{time, GrowattClient, SolarStore, SyncConfig};

use crate::config::SchedulerConfig;

/// Cron wrapper around the daily sync.
pub struct SyncScheduler {
    scheduler: JobScheduler,
}

impl SyncScheduler {
    /// Build the scheduler with the daily sync job registered.
    pub async fn new(config: &SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create scheduler: {e}"))?;

        let job = Job::new_async(config.cron.as_str(), |_uuid, _lock| {
            Box::pin(async move {
                run_once().await;
            })
        })
        .map_err(|e| anyhow!("Failed to create sync schedule: {e}"))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add sync schedule: {e}"))?;

        tracing::info!(cron = %config.cron, "Registered daily sync");
        Ok(Self { scheduler })
    }

    /// Start ticking. Returns immediately; jobs run in background tasks
    /// until shutdown.
    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {e}"))?;

        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop all scheduled jobs.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shut down scheduler: {e}"))?;

        tracing::info!("Scheduler shut down");
        Ok(())
    }
}

/// One isolated sync run. A failing run is logged with its run id and does
/// not stop the daemon; the next tick starts clean.
pub async fn run_once() {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, "Sync run starting");

    match execute(run_id).await {
        Ok(report) => {
            tracing::info!(
                %run_id,
                energy_kwh = ?report.energy_kwh,
                power_readings = report.power_readings,
                "Sync run finished"
            );
        }
        Err(err) => {
            tracing::error!(%run_id, error = %err, "Sync run failed");
        }
    }
}

async fn execute(run_id: Uuid) -> Result<daily::DailyReport> {
    // Provision per run: the run either has a working environment or does
    // not proceed.
    let config = SyncConfig::from_env()?;
    let client = GrowattClient::with_base_url(&config.api_token, &config.api_base);
    let store = SolarStore::connect(&config.mongo_uri).await?;

    let date = time::today_ist();
    tracing::debug!(%run_id, plant_id = config.plant_id, date = %date, "Run provisioned");

    let report = daily::run(&config, &client, &store, date).await?;
    Ok(report)
}
