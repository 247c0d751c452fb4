//! Historic backfills: walk backwards from today until the plant's first
//! recorded day, with a resume cursor in `ingest_meta` so an interrupted
//! walk picks up where it stopped.

use chrono::{Duration, NaiveDate};

use crate::config::SyncConfig;
use crate::error::IngestError;
use crate::growatt::{EnergyDay, GrowattClient, PowerPoint};
use crate::store::{DailyEnergy, Metric, SolarStore};
use crate::time;

use super::daily;

/// Inclusive width of one energy backfill window.
const WINDOW_DAYS: i64 = 7;

/// Consecutive API failures tolerated before the walk aborts.
const MAX_API_FAILURES: u32 = 5;

/// What a backfill walk accomplished.
#[derive(Debug, Default)]
pub struct BackfillReport {
    /// Windows (energy) or days (power) processed.
    pub windows: usize,
    /// Rows written, duplicates excluded.
    pub rows_written: usize,
}

/// Back-fill daily energy totals in 7-day windows, newest first.
pub async fn energy(
    config: &SyncConfig,
    client: &GrowattClient,
    store: &SolarStore,
) -> Result<BackfillReport, IngestError> {
    let mut window_end = match store.load_cursor(config.plant_id, Metric::Energy).await? {
        Some(date) => date,
        None => time::today_ist() - Duration::days(1),
    };
    tracing::info!(plant_id = config.plant_id, start = %window_end, "Starting energy backfill");

    let mut report = BackfillReport::default();
    let mut failures = 0u32;

    loop {
        let window_start = window_end - Duration::days(WINDOW_DAYS - 1);
        let rows = match client
            .plant_energy_history(config.plant_id, window_start, window_end)
            .await
        {
            Ok(rows) => {
                failures = 0;
                rows
            }
            Err(err) => {
                failures += 1;
                if failures >= MAX_API_FAILURES {
                    return Err(err);
                }
                tracing::warn!(error = %err, failures, "API error, pausing before retry");
                tokio::time::sleep(config.pause * 3).await;
                continue;
            }
        };

        if rows.is_empty() {
            tracing::info!(start = %window_start, end = %window_end, "Empty window, backfill done");
            break;
        }
        if !rows.iter().any(EnergyDay::has_output) {
            tracing::info!(
                start = %window_start,
                end = %window_end,
                "First all-zero window reached, backfill done"
            );
            break;
        }

        // Corrupt rows are dropped individually, matching the daily sync.
        let entries: Vec<DailyEnergy> = rows
            .iter()
            .filter_map(|row| {
                let day = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").ok()?;
                let kwh = row.energy?;
                Some(DailyEnergy {
                    plant_id: config.plant_id,
                    date: time::ist_day_start(day),
                    energy_kwh: kwh,
                })
            })
            .collect();

        let written = store.insert_daily_energy(&entries).await?;
        store
            .save_cursor(config.plant_id, Metric::Energy, window_start)
            .await?;

        report.windows += 1;
        report.rows_written += written;
        tracing::info!(start = %window_start, end = %window_end, written, "Window saved");

        window_end = window_start - Duration::days(1);
        tokio::time::sleep(config.pause).await;
    }

    Ok(report)
}

/// Back-fill the 5-minute power curve one day at a time, newest first.
pub async fn power(
    config: &SyncConfig,
    client: &GrowattClient,
    store: &SolarStore,
) -> Result<BackfillReport, IngestError> {
    let mut cursor = match store.load_cursor(config.plant_id, Metric::Power).await? {
        Some(date) => date,
        None => time::today_ist(),
    };
    tracing::info!(plant_id = config.plant_id, start = %cursor, "Starting power backfill");

    let mut report = BackfillReport::default();
    let mut failures = 0u32;

    loop {
        let records = match client.plant_power_overview(config.plant_id, cursor).await {
            Ok(records) => {
                failures = 0;
                records
            }
            Err(err) => {
                failures += 1;
                if failures >= MAX_API_FAILURES {
                    return Err(err);
                }
                tracing::warn!(error = %err, failures, "API error, pausing before retry");
                tokio::time::sleep(config.pause * 3).await;
                continue;
            }
        };

        if records.is_empty() {
            tracing::info!(date = %cursor, "Empty payload, backfill done");
            break;
        }
        if !records.iter().any(PowerPoint::has_output) {
            tracing::info!(date = %cursor, "Reached a day without output, historic window exhausted");
            break;
        }

        let (readings, _) = daily::build_power_readings(config.plant_id, &records);
        let written = store.insert_power_readings(&readings).await?;
        store
            .save_cursor(config.plant_id, Metric::Power, cursor)
            .await?;

        report.windows += 1;
        report.rows_written += written;
        tracing::info!(date = %cursor, written, "Day saved");

        cursor = cursor - Duration::days(1);
        tokio::time::sleep(config.pause).await;
    }

    Ok(report)
}
