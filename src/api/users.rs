use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::meta::{meta_object, meta_values};
use super::params::{JsonParams, Path, decode, optional_str, required_str};
use super::validation::{validate_email, validate_id, validate_meta_keys, validate_username};
use super::{ApiError, AppState, CreatedResponse, MetaKeysResponse, SuccessResponse, UserDto};
use crate::db::record::filter_params;
use crate::entities::users;
use crate::models::user::{NewUser, UserChanges};
use crate::policy::{Action, authorize};
use crate::services::Principal;

/// PUT /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    params: JsonParams,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let params = params.get_params(&["email", "username", "password"], &[])?;
    let password = required_str(&params, "password")?;

    let data = filter_params::<users::Entity>(
        &params,
        &["id", "created", "modified", "password", "role"],
    );
    let new_user: NewUser = decode(data)?;
    validate_username(&new_user.username)?;
    validate_email(&new_user.email)?;

    let user = state.user_service().create_user(new_user, &password).await?;
    let token = state.auth_service().issue_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("User created.", user.id).with_token(token)),
    ))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    authorize(&principal, Action::ReadUser)?;
    let user = state.user_service().get_user(validate_id(id)?).await?;
    Ok(Json(user.into()))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyUser(id))?;

    let params = params.get_params(&[], &[])?;
    let password = optional_str(&params, "password")?;

    let data = filter_params::<users::Entity>(
        &params,
        &["id", "created", "modified", "password", "role"],
    );
    let changes: UserChanges = decode(data)?;
    if let Some(username) = &changes.username {
        validate_username(username)?;
    }
    if let Some(email) = &changes.email {
        validate_email(email)?;
    }

    state
        .user_service()
        .update_user(validate_id(id)?, changes, password)
        .await?;

    Ok(Json(SuccessResponse::new("User updated.")))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyUser(id))?;
    state.user_service().delete_user(validate_id(id)?).await?;
    Ok(Json(SuccessResponse::new("User deleted.")))
}

// ============================================================================
// Meta
// ============================================================================

/// GET /users/{id}/meta
pub async fn get_meta_keys(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<MetaKeysResponse>, ApiError> {
    authorize(&principal, Action::ReadUser)?;
    let keys = state.user_service().list_meta_keys(id).await?;
    Ok(Json(MetaKeysResponse { keys }))
}

/// POST /users/{id}/meta with `{"keys": [...]}`
pub async fn get_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<Map<String, Value>>, ApiError> {
    authorize(&principal, Action::ReadUser)?;
    let params = params.get_params(&["keys"], &[])?;
    let keys = validate_meta_keys(&params)?;

    let values = state.user_service().get_meta_values(id, &keys).await?;
    Ok(Json(meta_object(values)))
}

/// PUT /users/{id}/meta
pub async fn set_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    params: JsonParams,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyUser(id))?;
    let values = meta_values(params.get_params(&[], &[])?)?;

    state.user_service().set_meta_values(id, values).await?;
    Ok(Json(SuccessResponse::new("User meta updated.")))
}

/// DELETE /users/{id}/meta/{key}
pub async fn delete_meta(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((id, key)): Path<(i32, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&principal, Action::ModifyUser(id))?;
    state.user_service().delete_meta(id, &key).await?;
    Ok(Json(SuccessResponse::new("User meta deleted.")))
}
