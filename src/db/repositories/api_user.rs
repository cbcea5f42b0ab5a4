use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entities::{api_users, prelude::*};

pub struct ApiUserRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ApiUserRepository<'a, C> {
    #[must_use]
    pub const fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<api_users::Model>> {
        ApiUsers::find()
            .filter(api_users::Column::Username.eq(username))
            .one(self.db)
            .await
            .context("Failed to query api user by username")
    }

    pub async fn create(&self, username: &str, password_hash: String) -> Result<i32> {
        let active = api_users::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password_hash),
            ..Default::default()
        };

        let model = active
            .insert(self.db)
            .await
            .context("Failed to insert api user")?;

        Ok(model.id)
    }

    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let result = ApiUsers::delete_many()
            .filter(api_users::Column::Username.eq(username))
            .exec(self.db)
            .await
            .context("Failed to delete api user")?;

        Ok(result.rows_affected > 0)
    }
}
