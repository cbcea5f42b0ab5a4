use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::meta::{meta_object, meta_values};
use super::params::{JsonParams, Path, QueryParams, decode, loose_i64};
use super::validation::validate_meta_keys;
use super::{
    ApiError, AppState, CreatedResponse, DataPageDto, FlightDto, MetaKeysResponse,
    SuccessResponse,
};
use crate::db::record::filter_params;
use crate::entities::flights_data;
use crate::models::flight::{NewDataPoint, PageRequest};
use crate::policy::{Action, authorize};
use crate::services::Principal;

const DATA_POINT_FIELDS: [&str; 6] = [
    "timestamp",
    "coordinate_x",
    "coordinate_y",
    "pressure",
    "temperature",
    "altitude",
];

/// PUT /flights
pub async fn create_flight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    authorize(&principal, Action::ManageFlights)?;
    let flight = state.flight_service().create_flight().await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Flight created.", flight.id)),
    ))
}

/// GET /flights/{id}
pub async fn get_flight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<FlightDto>, ApiError> {
    authorize(&principal, Action::ReadFlight)?;
    let flight = state.flight_service().get_flight(id).await?;
    Ok(Json(flight.into()))
}

/// DELETE /flights/{id}
pub async fn delete_flight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ManageFlights)?;
    state.flight_service().delete_flight(id).await?;
    Ok(Json(SuccessResponse::new("Flight deleted.")))
}

// ============================================================================
// Data points
// ============================================================================

/// PUT /flights/{id}/data
pub async fn create_data_point(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    authorize(&principal, Action::RecordFlightData)?;

    let params = params.get_params(&DATA_POINT_FIELDS, &[])?;
    let data = filter_params::<flights_data::Entity>(&params, &["id", "flight_id"]);
    let point: NewDataPoint = decode(data)?;

    let point = state.flight_service().add_data_point(id, point).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Flight data point created.", point.id)),
    ))
}

/// POST /flights/{id}/data with `{"page": n, "per_page": n}`
pub async fn get_data_paged(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<DataPageDto>, ApiError> {
    authorize(&principal, Action::ReadFlight)?;
    let params = params.get_params(&[], &[])?;
    let request = PageRequest::new(loose_i64(&params, "page"), loose_i64(&params, "per_page"));

    let page = state.flight_service().data_page(id, request).await?;
    Ok(Json(page.into()))
}

/// GET /flights/{id}/data?page=&per_page=
pub async fn list_data(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    QueryParams(query): QueryParams,
) -> Result<Json<DataPageDto>, ApiError> {
    authorize(&principal, Action::ReadFlight)?;
    let request = PageRequest::new(loose_i64(&query, "page"), loose_i64(&query, "per_page"));

    let page = state.flight_service().data_page(id, request).await?;
    Ok(Json(page.into()))
}

// ============================================================================
// Meta
// ============================================================================

/// GET /flights/{id}/meta
pub async fn get_meta_keys(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<MetaKeysResponse>, ApiError> {
    authorize(&principal, Action::ReadFlight)?;
    let keys = state.flight_service().list_meta_keys(id).await?;
    Ok(Json(MetaKeysResponse { keys }))
}

/// POST /flights/{id}/meta with `{"keys": [...]}`
pub async fn get_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<Map<String, Value>>, ApiError> {
    authorize(&principal, Action::ReadFlight)?;
    let params = params.get_params(&["keys"], &[])?;
    let keys = validate_meta_keys(&params)?;

    let values = state.flight_service().get_meta_values(id, &keys).await?;
    Ok(Json(meta_object(values)))
}

/// PUT /flights/{id}/meta
pub async fn set_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyFlightMeta)?;
    let values = meta_values(params.get_params(&[], &[])?)?;

    state.flight_service().set_meta_values(id, values).await?;
    Ok(Json(SuccessResponse::new("Flight meta updated.")))
}

/// DELETE /flights/{id}/meta/{key}
pub async fn delete_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((id, key)): Path<(i32, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyFlightMeta)?;
    state.flight_service().delete_meta(id, &key).await?;
    Ok(Json(SuccessResponse::new("Flight meta deleted.")))
}
