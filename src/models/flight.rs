use serde::{Deserialize, Serialize};

use crate::entities::{flights, flights_data};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flight {
    pub id: i32,
    pub created: String,
}

impl From<flights::Model> for Flight {
    fn from(model: flights::Model) -> Self {
        Self {
            id: model.id,
            created: model.created,
        }
    }
}

/// A recorded sample as submitted by a client. Every field is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewDataPoint {
    pub timestamp: i64,
    pub coordinate_x: f64,
    pub coordinate_y: f64,
    pub pressure: i32,
    pub temperature: i32,
    pub altitude: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub id: i32,
    pub flight_id: i32,
    pub timestamp: i64,
    pub coordinate_x: f64,
    pub coordinate_y: f64,
    pub pressure: i32,
    pub temperature: i32,
    pub altitude: i32,
}

impl From<flights_data::Model> for DataPoint {
    fn from(model: flights_data::Model) -> Self {
        Self {
            id: model.id,
            flight_id: model.flight_id,
            timestamp: model.timestamp,
            coordinate_x: model.coordinate_x,
            coordinate_y: model.coordinate_y,
            pressure: model.pressure,
            temperature: model.temperature,
            altitude: model.altitude,
        }
    }
}

/// One page of a flight's data points.
#[derive(Debug, Clone)]
pub struct DataPage {
    pub items: Vec<DataPoint>,
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Normalized offset/limit request. Out-of-range input falls back to the
/// defaults instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page
            .and_then(|p| u64::try_from(p).ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);

        let per_page = per_page
            .and_then(|p| u64::try_from(p).ok())
            .filter(|p| *p >= 1)
            .map_or(DEFAULT_PER_PAGE, |p| p.min(MAX_PER_PAGE));

        Self { page, per_page }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}
