//! Ingestion jobs: the daily sync and the historic backfills.

pub mod backfill;
pub mod daily;

/// Sampling interval of the power curve, as a fraction of an hour.
pub(crate) const INTERVAL_HOURS: f64 = 5.0 / 60.0;

/// Allowed divergence between integrated power and the API's daily kWh.
pub(crate) const ENERGY_MISMATCH_TOLERANCE_KWH: f64 = 1.0;
