//! Scheduler daemon for the daily Growatt sync.

pub mod config;
pub mod runner;

pub use config::SchedulerConfig;
pub use runner::SyncScheduler;
