//! Domain service for user accounts and their metadata.

use std::collections::BTreeMap;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::models::meta::MetaValue;
use crate::models::user::{NewUser, User, UserChanges};

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found.")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for UserError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Empty => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        // Lost a race against a concurrent insert of the same username/email.
        if let Some(SqlErr::UniqueConstraintViolation(_)) =
            err.downcast_ref::<DbErr>().and_then(DbErr::sql_err)
        {
            return Self::Conflict("Username or email already in use.".to_string());
        }
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for users.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user after checking username/email uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] when the username or email is taken.
    async fn create_user(&self, user: NewUser, password: &str) -> Result<User, UserError>;

    async fn get_user(&self, id: i32) -> Result<User, UserError>;

    /// Applies a partial update. A new password is re-hashed.
    async fn update_user(
        &self,
        id: i32,
        changes: UserChanges,
        password: Option<String>,
    ) -> Result<User, UserError>;

    async fn delete_user(&self, id: i32) -> Result<(), UserError>;

    // Metadata

    async fn list_meta_keys(&self, id: i32) -> Result<Vec<String>, UserError>;

    async fn get_meta_values(
        &self,
        id: i32,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<MetaValue>>, UserError>;

    async fn set_meta_values(
        &self,
        id: i32,
        values: Vec<(String, Option<MetaValue>)>,
    ) -> Result<(), UserError>;

    async fn delete_meta(&self, id: i32, key: &str) -> Result<(), UserError>;
}
