//! Domain service for authentication.
//!
//! Handles login, token issuance and per-request identity resolution for
//! both end users (bearer tokens) and api users (basic credentials).

use serde::Serialize;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::models::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Same message for unknown user and wrong password.
    #[error("Authentication failed.")]
    InvalidCredentials,

    #[error("{message}")]
    Token { status: u16, message: String },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            status: 401,
            message: message.into(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Issue(msg) => Self::Internal(msg),
            other => Self::token(other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Service account authenticated with basic credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiPrincipal {
    pub id: i32,
    pub username: String,
}

/// Whoever made the current request.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Service(ApiPrincipal),
}

impl Principal {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            Self::Service(_) => None,
        }
    }

    /// Label for logs and spans.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::User(user) => format!("user:{}", user.id),
            Self::Service(api) => format!("api:{}", api.username),
        }
    }
}

/// Login result: the user plus a freshly issued token.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Issues a token for an already authenticated user id.
    fn issue_token(&self, user_id: i32) -> Result<String, AuthError>;

    /// Hashes a password with the configured parameters.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// Resolves a bearer token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Token`] for expired, malformed or orphaned tokens.
    async fn resolve_token(&self, token: &str) -> Result<User, AuthError>;

    /// Checks api user credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the check fails.
    async fn verify_api_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ApiPrincipal, AuthError>;
}
