//! Domain service for flights, their data points and metadata.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::flight::{DataPage, DataPoint, Flight, NewDataPoint, PageRequest};
use crate::models::meta::MetaValue;

/// Errors specific to flight operations.
#[derive(Debug, Error)]
pub enum FlightError {
    #[error("Flight not found.")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for FlightError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FlightError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for flights.
#[async_trait::async_trait]
pub trait FlightService: Send + Sync {
    async fn create_flight(&self) -> Result<Flight, FlightError>;

    async fn get_flight(&self, id: i32) -> Result<Flight, FlightError>;

    /// Deletes the flight together with its data points and metadata.
    async fn delete_flight(&self, id: i32) -> Result<(), FlightError>;

    async fn add_data_point(
        &self,
        flight_id: i32,
        point: NewDataPoint,
    ) -> Result<DataPoint, FlightError>;

    async fn data_page(&self, flight_id: i32, request: PageRequest)
    -> Result<DataPage, FlightError>;

    // Metadata

    async fn list_meta_keys(&self, id: i32) -> Result<Vec<String>, FlightError>;

    async fn get_meta_values(
        &self,
        id: i32,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<MetaValue>>, FlightError>;

    async fn set_meta_values(
        &self,
        id: i32,
        values: Vec<(String, Option<MetaValue>)>,
    ) -> Result<(), FlightError>;

    async fn delete_meta(&self, id: i32, key: &str) -> Result<(), FlightError>;
}
