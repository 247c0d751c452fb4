//! MongoDB persistence for solar data.

mod models;
mod schema;

pub use models::{DailyEnergy, IngestCursor, Metric, PowerReading};

use bson::doc;
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::{FindOptions, InsertManyOptions, UpdateOptions};
use mongodb::{Client, Collection, Database};
use serde::Serialize;

use crate::error::IngestError;

/// Database holding the solar collections.
pub const DB_NAME: &str = "solar_data_v2";

const DUPLICATE_KEY: i32 = 11000;

/// Typed handles over the solar collections.
#[derive(Clone)]
pub struct SolarStore {
    power: Collection<PowerReading>,
    energy: Collection<DailyEnergy>,
    meta: Collection<IngestCursor>,
    db: Database,
}

impl SolarStore {
    /// Connect and select the solar database.
    pub async fn connect(uri: &str) -> Result<Self, IngestError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::with_database(client.database(DB_NAME)))
    }

    /// Build a store over an already-selected database.
    pub fn with_database(db: Database) -> Self {
        Self {
            power: db.collection("power_readings"),
            energy: db.collection("daily_energy"),
            meta: db.collection("ingest_meta"),
            db,
        }
    }

    /// Upsert one day's energy total, keyed on `(plant_id, date)`.
    ///
    /// Re-running a day replaces the row in place, so a correct row never
    /// duplicates and a corrected API figure wins.
    pub async fn upsert_daily_energy(&self, entry: &DailyEnergy) -> Result<(), IngestError> {
        let date = bson::DateTime::from_chrono(entry.date);
        let filter = doc! { "plant_id": entry.plant_id, "date": date };
        let update = doc! {
            "$set": {
                "plant_id": entry.plant_id,
                "date": date,
                "energy_kwh": entry.energy_kwh,
            }
        };

        self.energy
            .update_one(filter, update, UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(())
    }

    /// Bulk-insert daily energy rows, tolerating duplicate-key collisions.
    /// Used by the backfill, where existing rows are left untouched.
    pub async fn insert_daily_energy(&self, entries: &[DailyEnergy]) -> Result<usize, IngestError> {
        insert_ignoring_duplicates(&self.energy, entries).await
    }

    /// Bulk-insert power readings, tolerating duplicate-key collisions so a
    /// re-run of the same day is a no-op for rows already present.
    pub async fn insert_power_readings(
        &self,
        readings: &[PowerReading],
    ) -> Result<usize, IngestError> {
        insert_ignoring_duplicates(&self.power, readings).await
    }

    /// Daily energy rows inside a half-open UTC window, oldest first.
    pub async fn daily_energy_between(
        &self,
        plant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyEnergy>, IngestError> {
        let filter = doc! {
            "plant_id": plant_id,
            "date": {
                "$gte": bson::DateTime::from_chrono(from),
                "$lt": bson::DateTime::from_chrono(to),
            },
        };
        let options = FindOptions::builder().sort(doc! { "date": 1 }).build();
        let rows: Vec<DailyEnergy> = self.energy.find(filter, options).await?.try_collect().await?;
        Ok(rows)
    }

    /// Power readings inside a half-open UTC window, oldest first.
    pub async fn power_readings_between(
        &self,
        plant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PowerReading>, IngestError> {
        let filter = doc! {
            "plant_id": plant_id,
            "timestamp": {
                "$gte": bson::DateTime::from_chrono(from),
                "$lt": bson::DateTime::from_chrono(to),
            },
        };
        let options = FindOptions::builder().sort(doc! { "timestamp": 1 }).build();
        let rows: Vec<PowerReading> = self.power.find(filter, options).await?.try_collect().await?;
        Ok(rows)
    }

    /// Load the backfill resume cursor for a plant/metric, if any.
    pub async fn load_cursor(
        &self,
        plant_id: i64,
        metric: Metric,
    ) -> Result<Option<NaiveDate>, IngestError> {
        let found = self
            .meta
            .find_one(doc! { "plant_id": plant_id, "metric": metric.as_str() }, None)
            .await?;

        match found {
            Some(cursor) => match NaiveDate::parse_from_str(&cursor.last_date, "%Y-%m-%d") {
                Ok(date) => Ok(Some(date)),
                Err(err) => {
                    tracing::warn!(
                        plant_id,
                        metric = metric.as_str(),
                        last_date = %cursor.last_date,
                        error = %err,
                        "Ignoring corrupt resume cursor"
                    );
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Save the backfill resume cursor for a plant/metric.
    pub async fn save_cursor(
        &self,
        plant_id: i64,
        metric: Metric,
        last_date: NaiveDate,
    ) -> Result<(), IngestError> {
        let filter = doc! { "plant_id": plant_id, "metric": metric.as_str() };
        let update = doc! {
            "$set": {
                "last_date": last_date.format("%Y-%m-%d").to_string(),
                "updated_at": bson::DateTime::from_chrono(Utc::now()),
            }
        };

        self.meta
            .update_one(filter, update, UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(())
    }
}

/// Unordered bulk insert that treats a batch failing only on duplicate keys
/// (code 11000) as success. Any other write error propagates.
async fn insert_ignoring_duplicates<T>(
    collection: &Collection<T>,
    docs: &[T],
) -> Result<usize, IngestError>
where
    T: Serialize + Send + Sync,
{
    if docs.is_empty() {
        return Ok(0);
    }

    let options = InsertManyOptions::builder().ordered(false).build();
    match collection.insert_many(docs, options).await {
        Ok(outcome) => Ok(outcome.inserted_ids.len()),
        Err(err) => {
            if let ErrorKind::BulkWrite(failure) = &*err.kind {
                if let Some(write_errors) = &failure.write_errors {
                    let all_duplicates = !write_errors.is_empty()
                        && write_errors.iter().all(|we| we.code == DUPLICATE_KEY);
                    if all_duplicates && failure.write_concern_error.is_none() {
                        return Ok(docs.len() - write_errors.len());
                    }
                }
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `Client::with_uri_str` only parses the URI; connections are lazy, so
    // the empty-batch paths are exercisable without a running server.
    #[tokio::test]
    async fn test_empty_inserts_are_noops() {
        let store = SolarStore::connect("mongodb://localhost:27017").await.unwrap();
        assert_eq!(store.insert_power_readings(&[]).await.unwrap(), 0);
        assert_eq!(store.insert_daily_energy(&[]).await.unwrap(), 0);
    }
}
