use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::record;
use crate::entities::{flights, flights_data, flights_meta, prelude::*};
use crate::models::flight::{DataPage, DataPoint, Flight, NewDataPoint, PageRequest};

pub struct FlightRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FlightRepository<'a, C> {
    #[must_use]
    pub const fn new(db: &'a C) -> Self {
        Self { db }
    }

    // ========================================================================
    // Flights
    // ========================================================================

    pub async fn get(&self, id: i32) -> Result<Option<Flight>> {
        let flight = record::load::<Flights, _>(self.db, id).await?;
        Ok(flight.map(Flight::from))
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        let count = Flights::find_by_id(id)
            .count(self.db)
            .await
            .context("Failed to check flight existence")?;
        Ok(count > 0)
    }

    pub async fn create(&self) -> Result<Flight> {
        let active = flights::ActiveModel {
            created: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(self.db)
            .await
            .context("Failed to insert flight")?;

        Ok(Flight::from(model))
    }

    /// Delete a flight with its meta rows and data points.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        FlightsMeta::delete_many()
            .filter(flights_meta::Column::FlightId.eq(id))
            .exec(self.db)
            .await
            .context("Failed to delete flight meta")?;

        FlightsData::delete_many()
            .filter(flights_data::Column::FlightId.eq(id))
            .exec(self.db)
            .await
            .context("Failed to delete flight data")?;

        record::delete::<Flights, _>(self.db, id).await
    }

    // ========================================================================
    // Data points
    // ========================================================================

    pub async fn add_data_point(&self, flight_id: i32, point: NewDataPoint) -> Result<DataPoint> {
        let active = flights_data::ActiveModel {
            flight_id: Set(flight_id),
            timestamp: Set(point.timestamp),
            coordinate_x: Set(point.coordinate_x),
            coordinate_y: Set(point.coordinate_y),
            pressure: Set(point.pressure),
            temperature: Set(point.temperature),
            altitude: Set(point.altitude),
            ..Default::default()
        };

        let model = active
            .insert(self.db)
            .await
            .context("Failed to insert flight data point")?;

        Ok(DataPoint::from(model))
    }

    /// One page of a flight's data points, in time order. A page past the
    /// end is empty but still reports the totals.
    pub async fn data_page(&self, flight_id: i32, request: PageRequest) -> Result<DataPage> {
        let paginator = FlightsData::find()
            .filter(flights_data::Column::FlightId.eq(flight_id))
            .order_by_asc(flights_data::Column::Timestamp)
            .order_by_asc(flights_data::Column::Id)
            .paginate(self.db, request.per_page);

        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count flight data points")?;

        let items = paginator
            .fetch_page(request.page - 1)
            .await
            .context("Failed to fetch flight data page")?;

        Ok(DataPage {
            items: items.into_iter().map(DataPoint::from).collect(),
            total: totals.number_of_items,
            pages: totals.number_of_pages,
            page: request.page,
            per_page: request.per_page,
        })
    }
}
