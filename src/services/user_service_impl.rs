//! `SeaORM` implementation of the `UserService` trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use crate::auth::password;
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::entities::users_meta;
use crate::models::meta::MetaValue;
use crate::models::user::{NewUser, User, UserChanges};
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn ensure_exists(&self, id: i32) -> Result<User, UserError> {
        self.store.users().get(id).await?.ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(&self, user: NewUser, password: &str) -> Result<User, UserError> {
        let users = self.store.users();

        if users.username_taken(&user.username, None).await? {
            return Err(UserError::Conflict("Username already exists.".to_string()));
        }

        if users.email_taken(&user.email, None).await? {
            return Err(UserError::Conflict("Email already exists.".to_string()));
        }

        // A username must not shadow someone else's email address.
        if users.email_taken(&user.username, None).await? {
            return Err(UserError::Conflict(
                "User with that email address already exists.".to_string(),
            ));
        }

        let hash =
            password::hash_password_blocking(password.to_string(), self.security.clone()).await?;
        let created = users.create(user, hash).await?;

        info!(user_id = created.id, "User created");
        Ok(created)
    }

    async fn get_user(&self, id: i32) -> Result<User, UserError> {
        self.ensure_exists(id).await
    }

    async fn update_user(
        &self,
        id: i32,
        changes: UserChanges,
        password: Option<String>,
    ) -> Result<User, UserError> {
        self.ensure_exists(id).await?;
        let users = self.store.users();

        if let Some(username) = &changes.username
            && users.username_taken(username, Some(id)).await?
        {
            return Err(UserError::Conflict("Username already in use.".to_string()));
        }

        if let Some(email) = &changes.email
            && users.email_taken(email, Some(id)).await?
        {
            return Err(UserError::Conflict("Email already in use.".to_string()));
        }

        let hash = match password {
            Some(password) => Some(
                password::hash_password_blocking(password, self.security.clone()).await?,
            ),
            None => None,
        };

        users
            .update(id, changes, hash)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn delete_user(&self, id: i32) -> Result<(), UserError> {
        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound);
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn list_meta_keys(&self, id: i32) -> Result<Vec<String>, UserError> {
        self.ensure_exists(id).await?;
        Ok(self.store.user_meta().list_meta_keys(id).await?)
    }

    async fn get_meta_values(
        &self,
        id: i32,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<MetaValue>>, UserError> {
        self.ensure_exists(id).await?;
        Ok(self.store.user_meta().get_meta_many(id, keys).await?)
    }

    async fn set_meta_values(
        &self,
        id: i32,
        values: Vec<(String, Option<MetaValue>)>,
    ) -> Result<(), UserError> {
        self.ensure_exists(id).await?;
        self.store
            .set_meta_values::<users_meta::Entity>(id, values)
            .await?;
        Ok(())
    }

    async fn delete_meta(&self, id: i32, key: &str) -> Result<(), UserError> {
        self.ensure_exists(id).await?;
        Ok(self.store.user_meta().delete_meta(id, key).await?)
    }
}
