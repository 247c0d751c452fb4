//! Daily sync: one day's energy total and power curve.
//!
//! Pulls the energy figure first, then the 5-minute power curve, integrates
//! the curve into its own kWh figure, and cross-checks the two. Validation
//! failures skip the write with a warning; only transport and database
//! errors fail the run.

use chrono::NaiveDate;

use crate::config::SyncConfig;
use crate::error::IngestError;
use crate::growatt::{EnergyDay, GrowattClient, PowerPoint};
use crate::store::{DailyEnergy, PowerReading, SolarStore};
use crate::time;

use super::{ENERGY_MISMATCH_TOLERANCE_KWH, INTERVAL_HOURS};

/// What a daily run accomplished.
#[derive(Debug, Default)]
pub struct DailyReport {
    /// kWh accepted from the energy endpoint, if the payload validated.
    pub energy_kwh: Option<f64>,
    /// Number of power readings written (duplicates excluded).
    pub power_readings: usize,
}

/// Pull one day's energy and power data and write it to the store.
pub async fn run(
    config: &SyncConfig,
    client: &GrowattClient,
    store: &SolarStore,
    date: NaiveDate,
) -> Result<DailyReport, IngestError> {
    tracing::info!(plant_id = config.plant_id, date = %date, "Pulling daily data");

    let energy_payload = client
        .plant_energy_history(config.plant_id, date, date)
        .await?;
    let energy_kwh = validate_energy(&energy_payload, date);

    if let Some(kwh) = energy_kwh {
        let entry = DailyEnergy {
            plant_id: config.plant_id,
            date: time::ist_day_start(date),
            energy_kwh: kwh,
        };
        store.upsert_daily_energy(&entry).await?;
        tracing::info!(date = %date, energy_kwh = kwh, "Upserted daily energy");
    }

    // Rate-limit courtesy between the two API calls.
    tokio::time::sleep(config.pause).await;

    let power_payload = client
        .plant_power_overview(config.plant_id, date)
        .await?;
    let power_readings =
        ingest_power(store, config.plant_id, &power_payload, date, energy_kwh).await?;

    Ok(DailyReport {
        energy_kwh,
        power_readings,
    })
}

/// Validate the single-day energy payload. A bad payload is skipped with a
/// warning, not a run failure.
fn validate_energy(records: &[EnergyDay], date: NaiveDate) -> Option<f64> {
    if records.is_empty() {
        tracing::warn!(date = %date, "No energy data returned, skipping");
        return None;
    }
    if records.len() != 1 {
        tracing::warn!(
            date = %date,
            count = records.len(),
            "Multiple energy records for one day, skipping"
        );
        return None;
    }

    let record = &records[0];
    let Some(kwh) = record.energy else {
        tracing::warn!(date = %date, "Energy value missing or unparsable, skipping");
        return None;
    };

    match NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") {
        Ok(day) if day == date => {}
        Ok(day) => {
            tracing::warn!(
                requested = %date,
                returned = %day,
                "Energy record is for a different day, skipping"
            );
            return None;
        }
        Err(err) => {
            tracing::warn!(date = %date, raw = %record.date, error = %err, "Unparsable energy record date, skipping");
            return None;
        }
    }

    if kwh < 0.0 {
        tracing::warn!(date = %date, kwh, "Negative energy value, skipping");
        return None;
    }

    Some(kwh)
}

async fn ingest_power(
    store: &SolarStore,
    plant_id: i64,
    records: &[PowerPoint],
    date: NaiveDate,
    api_kwh: Option<f64>,
) -> Result<usize, IngestError> {
    if records.is_empty() {
        tracing::warn!(date = %date, "No power data returned, skipping");
        return Ok(0);
    }
    if !records.iter().any(PowerPoint::has_output) {
        tracing::warn!(date = %date, "All power records are zero or null, skipping");
        return Ok(0);
    }

    let (readings, integrated_kwh) = build_power_readings(plant_id, records);
    if readings.is_empty() {
        tracing::warn!(date = %date, "No valid power records after filtering, skipping");
        return Ok(0);
    }

    if let Some(api) = api_kwh {
        let divergence = (integrated_kwh - api).abs();
        if divergence > ENERGY_MISMATCH_TOLERANCE_KWH {
            tracing::warn!(
                date = %date,
                integrated_kwh,
                api_kwh = api,
                "Integrated energy diverges from the API figure"
            );
        }
    }

    let written = store.insert_power_readings(&readings).await?;
    tracing::info!(date = %date, written, total = readings.len(), "Stored power readings");
    Ok(written)
}

/// Convert raw samples into documents, integrating the 5-minute curve into a
/// daily kWh figure as we go. Samples with a missing or malformed timestamp
/// are dropped individually.
pub(crate) fn build_power_readings(
    plant_id: i64,
    records: &[PowerPoint],
) -> (Vec<PowerReading>, f64) {
    let mut readings = Vec::with_capacity(records.len());
    let mut total_wh = 0.0;

    for record in records {
        let Some(raw_time) = record.time.as_deref() else {
            continue;
        };
        let timestamp = match time::parse_ist_timestamp(raw_time) {
            Ok(ts) => ts,
            Err(err) => {
                tracing::warn!(raw = raw_time, error = %err, "Skipping power sample with bad timestamp");
                continue;
            }
        };

        let power = record.power.unwrap_or(0.0);
        total_wh += power * INTERVAL_HOURS;
        readings.push(PowerReading {
            plant_id,
            timestamp,
            power_w: power,
        });
    }

    (readings, total_wh / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: Option<&str>, power: Option<f64>) -> PowerPoint {
        PowerPoint {
            time: time.map(str::to_string),
            power,
        }
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_integrates_five_minute_samples() {
        // 12 samples of 1200 W over 5-minute intervals is exactly 1.2 kWh.
        let records: Vec<PowerPoint> = (0..12)
            .map(|i| point(Some(&format!("2024-01-15 10:{:02}:00", i * 5)), Some(1200.0)))
            .collect();

        let (readings, kwh) = build_power_readings(7, &records);
        assert_eq!(readings.len(), 12);
        assert!((kwh - 1.2).abs() < 1e-9);
        assert!(readings.iter().all(|r| r.plant_id == 7));
    }

    #[test]
    fn test_skips_samples_with_bad_timestamps() {
        let records = vec![
            point(Some("2024-01-15 10:00:00"), Some(600.0)),
            point(None, Some(600.0)),
            point(Some("garbage"), Some(600.0)),
        ];

        let (readings, kwh) = build_power_readings(1, &records);
        assert_eq!(readings.len(), 1);
        assert!((kwh - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_null_power_stored_as_zero() {
        let records = vec![point(Some("2024-01-15 10:00:00"), None)];
        let (readings, kwh) = build_power_readings(1, &records);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].power_w, 0.0);
        assert_eq!(kwh, 0.0);
    }

    #[test]
    fn test_validate_energy_accepts_matching_day() {
        let records = vec![EnergyDay {
            date: "2024-01-15".to_string(),
            energy: Some(42.5),
        }];
        assert_eq!(validate_energy(&records, day("2024-01-15")), Some(42.5));
    }

    #[test]
    fn test_validate_energy_rejects_empty_payload() {
        assert_eq!(validate_energy(&[], day("2024-01-15")), None);
    }

    #[test]
    fn test_validate_energy_rejects_multiple_records() {
        let records = vec![
            EnergyDay {
                date: "2024-01-15".to_string(),
                energy: Some(42.5),
            },
            EnergyDay {
                date: "2024-01-16".to_string(),
                energy: Some(40.0),
            },
        ];
        assert_eq!(validate_energy(&records, day("2024-01-15")), None);
    }

    #[test]
    fn test_validate_energy_rejects_date_mismatch() {
        let records = vec![EnergyDay {
            date: "2024-01-14".to_string(),
            energy: Some(42.5),
        }];
        assert_eq!(validate_energy(&records, day("2024-01-15")), None);
    }

    #[test]
    fn test_validate_energy_rejects_negative_value() {
        let records = vec![EnergyDay {
            date: "2024-01-15".to_string(),
            energy: Some(-1.0),
        }];
        assert_eq!(validate_energy(&records, day("2024-01-15")), None);
    }

    #[test]
    fn test_day_without_output_detected() {
        let records = vec![
            point(Some("2024-01-15 10:00:00"), None),
            point(Some("2024-01-15 10:05:00"), Some(0.0)),
        ];
        assert!(!records.iter().any(PowerPoint::has_output));
    }
}
