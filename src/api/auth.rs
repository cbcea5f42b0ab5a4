use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use super::params::{JsonParams, required_str};
use super::{ApiError, AppState, LoginResponse};
use crate::services::Principal;

// ============================================================================
// Credentials
// ============================================================================

/// What the `Authorization` header carried.
#[derive(Debug, PartialEq, Eq)]
enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

fn parse_authorization(headers: &HeaderMap) -> Result<Credentials, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::token("Request does not contain an access token"))?
        .to_str()
        .map_err(|_| ApiError::token("Invalid token"))?
        .trim();

    let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
    let rest = rest.trim();

    if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt") {
        if rest.is_empty() || rest.contains(' ') {
            return Err(ApiError::token("Invalid token"));
        }
        return Ok(Credentials::Bearer(rest.to_string()));
    }

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD
            .decode(rest)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApiError::token("Invalid basic credentials"))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| ApiError::token("Invalid basic credentials"))?;

        return Ok(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    Err(ApiError::token("Unsupported authorization type"))
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from the `Authorization` header:
/// 1. `Bearer <jwt>` (or `JWT <jwt>`) for end users
/// 2. `Basic base64(username:password)` for api users
///
/// The resolved [`Principal`] is stored as a request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match parse_authorization(request.headers())? {
        Credentials::Bearer(token) => {
            Principal::User(state.auth_service().resolve_token(&token).await?)
        }
        Credentials::Basic { username, password } => Principal::Service(
            state
                .auth_service()
                .verify_api_user(&username, &password)
                .await?,
        ),
    };

    tracing::Span::current().record("user_id", principal.name().as_str());
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    params: JsonParams,
) -> Result<Json<LoginResponse>, ApiError> {
    let params = params.get_params(&["username", "password"], &[])?;
    let username = required_str(&params, "username")?;
    let password = required_str(&params, "password")?;

    let result = state.auth_service().login(&username, &password).await?;
    tracing::info!(user_id = result.user.id, "User logged in");

    Ok(Json(LoginResponse::new(result.user, result.token)))
}
