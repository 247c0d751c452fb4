//! Ingestion error types.

use thiserror::Error;

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Configuration or environment error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The Growatt API returned an error envelope or an unusable payload.
    #[error("Growatt API error: {0}")]
    Api(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// MongoDB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Date or timestamp parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Http(e.to_string())
    }
}

impl From<mongodb::error::Error> for IngestError {
    fn from(e: mongodb::error::Error) -> Self {
        IngestError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Json(e.to_string())
    }
}

impl From<chrono::ParseError> for IngestError {
    fn from(e: chrono::ParseError) -> Self {
        IngestError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::Configuration("GROWATT_TOKEN missing".to_string());
        assert_eq!(err.to_string(), "Configuration error: GROWATT_TOKEN missing");

        let err = IngestError::Api("plant/power returned error 10011".to_string());
        assert_eq!(
            err.to_string(),
            "Growatt API error: plant/power returned error 10011"
        );
    }

    #[test]
    fn test_error_from_chrono() {
        let parse_err = chrono::NaiveDate::parse_from_str("not-a-date", "%Y-%m-%d").unwrap_err();
        let err: IngestError = parse_err.into();
        assert!(matches!(err, IngestError::Parse(_)));
    }
}
