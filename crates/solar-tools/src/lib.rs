//! Solarsync ingestion library.
//!
//! Pulls plant data from the Growatt OpenAPI and writes it to MongoDB:
//! 5-minute power readings into a time-series collection and daily kWh
//! totals into a validated summary collection. The scheduler daemon and
//! the CLI both drive the jobs in [`jobs`].

pub mod config;
pub mod error;
pub mod growatt;
pub mod jobs;
pub mod report;
pub mod store;
pub mod time;

pub use config::SyncConfig;
pub use error::IngestError;
pub use growatt::GrowattClient;
pub use store::SolarStore;
