use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AuthService, FlightService, UserService};
use crate::state::SharedState;

pub mod auth;
mod error;
mod flights;
mod meta;
mod observability;
pub mod params;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn flight_service(&self) -> &Arc<dyn FlightService> {
        &self.shared.flight_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let prefix = format!("/{}", config.server.api_version.trim_matches('/'));
    let cors_origins = config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/login", post(auth::login))
        .route("/users", put(users::create_user))
        .method_not_allowed_fallback(method_not_allowed);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest(&prefix, api_router)
        .route("/metrics", get(observability::get_metrics))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        // Innermost of the two, so the auth middleware records `user_id` on the `request` span
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/{id}/meta",
            get(users::get_meta_keys)
                .post(users::get_meta)
                .put(users::set_meta),
        )
        .route("/users/{id}/meta/{key}", delete(users::delete_meta))
        .route("/flights", put(flights::create_flight))
        .route(
            "/flights/{id}",
            get(flights::get_flight).delete(flights::delete_flight),
        )
        .route(
            "/flights/{id}/data",
            get(flights::list_data)
                .post(flights::get_data_paged)
                .put(flights::create_data_point),
        )
        .route(
            "/flights/{id}/meta",
            get(flights::get_meta_keys)
                .post(flights::get_meta)
                .put(flights::set_meta),
        )
        .route("/flights/{id}/meta/{key}", delete(flights::delete_meta))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed.".to_string())
}
