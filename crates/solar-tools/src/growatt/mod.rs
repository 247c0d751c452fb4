//! Growatt OpenAPI v1 client.

mod models;

pub use models::{EnergyDay, PowerPoint};

use std::time::Duration;

use chrono::NaiveDate;

use crate::error::IngestError;
use models::{ApiEnvelope, EnergyHistory, PowerOverview};

/// Public Growatt OpenAPI endpoint.
pub const DEFAULT_API_BASE: &str = "https://openapi.growatt.com/v1";

/// HTTP client for the Growatt OpenAPI v1. The token rides in the `token`
/// header on every request.
#[derive(Clone)]
pub struct GrowattClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GrowattClient {
    /// Create a client against the public API endpoint.
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch the day's 5-minute power curve.
    pub async fn plant_power_overview(
        &self,
        plant_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<PowerPoint>, IngestError> {
        tracing::debug!(plant_id, date = %day, "Fetching power overview");

        let overview: PowerOverview = self
            .get(
                "plant/power",
                &[
                    ("plant_id", plant_id.to_string()),
                    ("date", day.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;

        Ok(overview.powers)
    }

    /// Fetch daily energy totals for an inclusive date range.
    pub async fn plant_energy_history(
        &self,
        plant_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EnergyDay>, IngestError> {
        tracing::debug!(plant_id, start = %start, end = %end, "Fetching energy history");

        let history: EnergyHistory = self
            .get(
                "plant/energy",
                &[
                    ("plant_id", plant_id.to_string()),
                    ("start_date", start.format("%Y-%m-%d").to_string()),
                    ("end_date", end.format("%Y-%m-%d").to_string()),
                    ("time_unit", "day".to_string()),
                    ("page", "1".to_string()),
                    ("perpage", "99".to_string()),
                ],
            )
            .await?;

        Ok(history.energys)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, IngestError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("token", &self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Api(format!(
                "HTTP {status} from {path}: {body}"
            )));
        }

        let envelope: ApiEnvelope<T> = response.json().await?;
        if envelope.error_code != 0 {
            return Err(IngestError::Api(format!(
                "{path} returned error {}: {}",
                envelope.error_code,
                envelope.error_msg.unwrap_or_default()
            )));
        }

        // A successful envelope with no data block means "nothing for that
        // range", not a failure.
        Ok(envelope.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GrowattClient::with_base_url("t", "https://example.com/v1/");
        assert_eq!(client.base_url, "https://example.com/v1");
    }

    #[test]
    fn test_default_base_url() {
        let client = GrowattClient::new("t");
        assert_eq!(client.base_url, DEFAULT_API_BASE);
    }
}
