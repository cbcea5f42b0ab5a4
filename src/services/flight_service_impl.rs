//! `SeaORM` implementation of the `FlightService` trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::Store;
use crate::entities::flights_meta;
use crate::models::flight::{DataPage, DataPoint, Flight, NewDataPoint, PageRequest};
use crate::models::meta::MetaValue;
use crate::services::flight_service::{FlightError, FlightService};

pub struct SeaOrmFlightService {
    store: Store,
}

impl SeaOrmFlightService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_exists(&self, id: i32) -> Result<(), FlightError> {
        if self.store.flights().exists(id).await? {
            Ok(())
        } else {
            Err(FlightError::NotFound)
        }
    }
}

#[async_trait]
impl FlightService for SeaOrmFlightService {
    async fn create_flight(&self) -> Result<Flight, FlightError> {
        let flight = self.store.flights().create().await?;
        info!(flight_id = flight.id, "Flight created");
        Ok(flight)
    }

    async fn get_flight(&self, id: i32) -> Result<Flight, FlightError> {
        self.store
            .flights()
            .get(id)
            .await?
            .ok_or(FlightError::NotFound)
    }

    async fn delete_flight(&self, id: i32) -> Result<(), FlightError> {
        if !self.store.delete_flight(id).await? {
            return Err(FlightError::NotFound);
        }
        info!(flight_id = id, "Flight deleted");
        Ok(())
    }

    async fn add_data_point(
        &self,
        flight_id: i32,
        point: NewDataPoint,
    ) -> Result<DataPoint, FlightError> {
        self.ensure_exists(flight_id).await?;
        let point = self.store.flights().add_data_point(flight_id, point).await?;
        debug!(flight_id, point_id = point.id, "Data point recorded");
        Ok(point)
    }

    async fn data_page(
        &self,
        flight_id: i32,
        request: PageRequest,
    ) -> Result<DataPage, FlightError> {
        self.ensure_exists(flight_id).await?;
        Ok(self.store.flights().data_page(flight_id, request).await?)
    }

    async fn list_meta_keys(&self, id: i32) -> Result<Vec<String>, FlightError> {
        self.ensure_exists(id).await?;
        Ok(self.store.flight_meta().list_meta_keys(id).await?)
    }

    async fn get_meta_values(
        &self,
        id: i32,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<MetaValue>>, FlightError> {
        self.ensure_exists(id).await?;
        Ok(self.store.flight_meta().get_meta_many(id, keys).await?)
    }

    async fn set_meta_values(
        &self,
        id: i32,
        values: Vec<(String, Option<MetaValue>)>,
    ) -> Result<(), FlightError> {
        self.ensure_exists(id).await?;
        self.store
            .set_meta_values::<flights_meta::Entity>(id, values)
            .await?;
        Ok(())
    }

    async fn delete_meta(&self, id: i32, key: &str) -> Result<(), FlightError> {
        self.ensure_exists(id).await?;
        Ok(self.store.flight_meta().delete_meta(id, key).await?)
    }
}
