//! Daemon configuration.

use anyhow::Result;

/// Default schedule: 18:30 UTC, i.e. midnight on the IST calendar, once the
/// plant's full day of data is available.
pub const DEFAULT_CRON: &str = "0 30 18 * * *";

/// Scheduler daemon configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Six-field cron expression for the daily sync.
    pub cron: String,

    /// Run one sync immediately at startup, before the first tick.
    pub run_on_start: bool,
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cron = std::env::var("SYNC_CRON").unwrap_or_else(|_| DEFAULT_CRON.to_string());

        let run_on_start = std::env::var("SYNC_RUN_ON_START")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(Self { cron, run_on_start })
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.to_string(),
            run_on_start: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.cron, DEFAULT_CRON);
        assert!(!config.run_on_start);
    }

    #[test]
    fn test_default_cron_is_daily() {
        // Six fields, fixed second/minute/hour, every day.
        let fields: Vec<&str> = DEFAULT_CRON.split_whitespace().collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(&fields[3..], &["*", "*", "*"]);
        assert!(fields[..3].iter().all(|f| !f.contains('*')));
    }

    #[test]
    fn test_default_cron_accepted_by_scheduler() {
        // Registering the job is where the expression is actually parsed.
        let job =
            tokio_cron_scheduler::Job::new_async(DEFAULT_CRON, |_uuid, _lock| Box::pin(async {}));
        assert!(job.is_ok());

        let bad =
            tokio_cron_scheduler::Job::new_async("every full moon", |_uuid, _lock| {
                Box::pin(async {})
            });
        assert!(bad.is_err());
    }
}
