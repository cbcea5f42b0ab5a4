use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::auth::password::PasswordError;
use crate::policy::Denied;
use crate::services::{AuthError, FlightError, UserError};

/// Message returned for every failure whose details stay in the logs.
pub const GENERIC_ERROR: &str = "Generic error.";

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    NotFound(String),

    Conflict(String),

    AuthenticationFailed(String),

    AuthorizationDenied(String),

    MethodNotAllowed(String),

    TokenInvalid { status: u16, message: String },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::AuthenticationFailed(msg) => write!(f, "Authentication failed: {msg}"),
            Self::AuthorizationDenied(msg) => write!(f, "Forbidden: {msg}"),
            Self::MethodNotAllowed(msg) => write!(f, "Method not allowed: {msg}"),
            Self::TokenInvalid { status, message } => write!(f, "Token error ({status}): {message}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Self::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::TokenInvalid { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::UNAUTHORIZED)
            }
        }
    }

    /// Text sent to the client.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::AuthenticationFailed(msg)
            | Self::AuthorizationDenied(msg)
            | Self::MethodNotAllowed(msg)
            | Self::TokenInvalid { message: msg, .. } => msg,
            Self::DatabaseError(_) | Self::InternalError(_) => GENERIC_ERROR,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn token(message: impl Into<String>) -> Self {
        Self::TokenInvalid {
            status: 401,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::DatabaseError(detail) => log_failure("Database error", detail),
            Self::InternalError(detail) => log_failure("Internal error", detail),
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        let body = json!({ "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

/// Outermost context of an `{:#}`-formatted error chain.
fn summary(detail: &str) -> &str {
    detail.split(": ").next().unwrap_or(detail)
}

/// The summary goes out at `error`; the full chain only at `debug`, which the
/// `debug` config flag turns on.
fn log_failure(kind: &str, detail: &str) {
    tracing::error!("{kind}: {}", summary(detail));
    tracing::debug!(error_chain = %detail, "{kind}");
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<Denied> for ApiError {
    fn from(err: Denied) -> Self {
        Self::AuthorizationDenied(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::AuthenticationFailed(err.to_string()),
            AuthError::Token { status, message } => Self::TokenInvalid { status, message },
            AuthError::Password(e @ PasswordError::Empty) => Self::validation(e.to_string()),
            AuthError::Password(e) => Self::InternalError(e.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::not_found(err.to_string()),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Validation(msg) => Self::ValidationError(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FlightError> for ApiError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::NotFound => Self::not_found(err.to_string()),
            FlightError::Validation(msg) => Self::ValidationError(msg),
            FlightError::Database(msg) => Self::DatabaseError(msg),
            FlightError::Internal(msg) => Self::InternalError(msg),
        }
    }
}
