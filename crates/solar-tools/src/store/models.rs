//! MongoDB document models.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One 5-minute power sample in the `power_readings` time-series collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerReading {
    pub plant_id: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    pub power_w: f64,
}

/// One day's kWh total in `daily_energy`, keyed on `(plant_id, date)`.
/// `date` is UTC midnight of the plant's IST calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEnergy {
    pub plant_id: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub energy_kwh: f64,
}

/// Resume cursor in `ingest_meta`, one per plant and metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCursor {
    pub plant_id: i64,
    pub metric: Metric,
    /// ISO date of the oldest window already ingested.
    pub last_date: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Which historic walk a cursor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Energy,
    Power,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Energy => "energy",
            Metric::Power => "power",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_reading_serializes_bson_date() {
        let reading = PowerReading {
            plant_id: 1,
            timestamp: Utc::now(),
            power_w: 850.0,
        };
        let doc = bson::to_document(&reading).unwrap();
        assert!(matches!(doc.get("timestamp"), Some(bson::Bson::DateTime(_))));
        assert_eq!(doc.get_f64("power_w").unwrap(), 850.0);
    }

    #[test]
    fn test_daily_energy_serializes_bson_date() {
        let entry = DailyEnergy {
            plant_id: 1,
            date: Utc::now(),
            energy_kwh: 42.5,
        };
        let doc = bson::to_document(&entry).unwrap();
        assert!(matches!(doc.get("date"), Some(bson::Bson::DateTime(_))));
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(Metric::Energy.as_str(), "energy");
        assert_eq!(
            serde_json::to_string(&Metric::Power).unwrap(),
            "\"power\""
        );
    }
}
