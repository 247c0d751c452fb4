//! Collection and index setup for the solar database.

use bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::{
    CreateCollectionOptions, IndexOptions, TimeseriesGranularity, TimeseriesOptions,
};
use mongodb::IndexModel;

use super::SolarStore;
use crate::error::IngestError;

const NAMESPACE_EXISTS: i32 = 48;

impl SolarStore {
    /// Create the data collections and their indexes. Safe to run repeatedly:
    /// existing collections are left alone and index creation is idempotent.
    pub async fn ensure_schema(&self) -> Result<(), IngestError> {
        self.create_power_collection().await?;
        self.create_energy_collection().await?;

        self.power
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "plant_id": 1, "timestamp": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("plant_ts_idx".to_string())
                            .build(),
                    )
                    .build(),
                None,
            )
            .await?;

        self.energy
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "plant_id": 1, "date": 1 })
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name("plant_date_idx".to_string())
                            .build(),
                    )
                    .build(),
                None,
            )
            .await?;

        tracing::info!("MongoDB schema ready");
        Ok(())
    }

    /// `power_readings` is a time-series collection bucketed per plant.
    async fn create_power_collection(&self) -> Result<(), IngestError> {
        let timeseries = TimeseriesOptions::builder()
            .time_field("timestamp".to_string())
            .meta_field(Some("plant_id".to_string()))
            .granularity(Some(TimeseriesGranularity::Minutes))
            .build();
        let options = CreateCollectionOptions::builder()
            .timeseries(timeseries)
            .build();

        match self.db.create_collection("power_readings", options).await {
            Ok(()) => Ok(()),
            Err(err) if collection_exists(&err) => {
                tracing::debug!("power_readings already exists");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// `daily_energy` carries a JSON-schema validator mirroring what the
    /// ingestion writes: a BSON date and a non-negative double.
    async fn create_energy_collection(&self) -> Result<(), IngestError> {
        let validator = doc! {
            "$jsonSchema": {
                "bsonType": "object",
                "required": ["date", "energy_kwh"],
                "properties": {
                    "date": { "bsonType": "date" },
                    "energy_kwh": { "bsonType": "double", "minimum": 0 },
                }
            }
        };
        let options = CreateCollectionOptions::builder()
            .validator(validator)
            .build();

        match self.db.create_collection("daily_energy", options).await {
            Ok(()) => Ok(()),
            Err(err) if collection_exists(&err) => {
                tracing::debug!("daily_energy already exists");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn collection_exists(err: &mongodb::error::Error) -> bool {
    matches!(&*err.kind, ErrorKind::Command(command) if command.code == NAMESPACE_EXISTS)
}
