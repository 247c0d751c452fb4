//! Growatt OpenAPI v1 payload models.

use serde::{Deserialize, Deserializer};

/// Response envelope shared by the v1 endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PowerOverview {
    #[serde(default)]
    pub powers: Vec<PowerPoint>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EnergyHistory {
    #[serde(default)]
    pub energys: Vec<EnergyDay>,
}

/// One 5-minute power sample. Both fields can be null in real payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct PowerPoint {
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub power: Option<f64>,
}

impl PowerPoint {
    /// True when the sample carries a usable non-zero power value.
    pub fn has_output(&self) -> bool {
        matches!(self.power, Some(p) if p != 0.0)
    }
}

/// One day's energy total. The API emits `energy` as a number or a string,
/// and empty strings stand in for missing values.
#[derive(Debug, Clone, Deserialize)]
pub struct EnergyDay {
    pub date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub energy: Option<f64>,
}

impl EnergyDay {
    /// True when the day carries a usable non-zero energy value.
    pub fn has_output(&self) -> bool {
        matches!(self.energy, Some(e) if e != 0.0)
    }
}

/// Accepts numbers, numeric strings, empty strings, and null.
fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(de)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_energy_value_as_number() {
        let day: EnergyDay =
            serde_json::from_value(json!({"date": "2024-01-15", "energy": 12.5})).unwrap();
        assert_eq!(day.energy, Some(12.5));
    }

    #[test]
    fn test_energy_value_as_string() {
        let day: EnergyDay =
            serde_json::from_value(json!({"date": "2024-01-15", "energy": "12.5"})).unwrap();
        assert_eq!(day.energy, Some(12.5));
    }

    #[test]
    fn test_energy_value_empty_or_null() {
        let day: EnergyDay =
            serde_json::from_value(json!({"date": "2024-01-15", "energy": ""})).unwrap();
        assert_eq!(day.energy, None);

        let day: EnergyDay =
            serde_json::from_value(json!({"date": "2024-01-15", "energy": null})).unwrap();
        assert_eq!(day.energy, None);

        let day: EnergyDay = serde_json::from_value(json!({"date": "2024-01-15"})).unwrap();
        assert_eq!(day.energy, None);
    }

    #[test]
    fn test_power_point_has_output() {
        let point: PowerPoint =
            serde_json::from_value(json!({"time": "2024-01-15 10:05", "power": 850.0})).unwrap();
        assert!(point.has_output());

        let point: PowerPoint =
            serde_json::from_value(json!({"time": "2024-01-15 10:05", "power": null})).unwrap();
        assert!(!point.has_output());

        let point: PowerPoint =
            serde_json::from_value(json!({"time": "2024-01-15 10:05", "power": 0})).unwrap();
        assert!(!point.has_output());
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: ApiEnvelope<EnergyHistory> =
            serde_json::from_value(json!({"error_code": 0, "error_msg": null})).unwrap();
        assert_eq!(envelope.error_code, 0);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_with_error() {
        let envelope: ApiEnvelope<PowerOverview> =
            serde_json::from_value(json!({"error_code": 10011, "error_msg": "permission denied"}))
                .unwrap();
        assert_eq!(envelope.error_code, 10011);
        assert_eq!(envelope.error_msg.as_deref(), Some("permission denied"));
    }
}
