use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TryIntoModel,
};

use crate::db::record;
use crate::entities::{prelude::*, users, users_meta};
use crate::entities::users::Role;
use crate::models::user::{NewUser, User, UserChanges};

/// Repository for user accounts. Works on any connection, so callers can
/// stage several writes on one transaction.
pub struct UserRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    #[must_use]
    pub const fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: i32) -> Result<Option<User>> {
        let user = record::load::<Users, _>(self.db, id).await?;
        Ok(user.map(User::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(self.db)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password = u.password.clone();
            (User::from(u), password)
        }))
    }

    /// Whether `username` belongs to a user other than `except`.
    pub async fn username_taken(&self, username: &str, except: Option<i32>) -> Result<bool> {
        self.column_taken(users::Column::Username, username, except)
            .await
            .context("Failed to check username availability")
    }

    /// Whether `email` belongs to a user other than `except`.
    pub async fn email_taken(&self, email: &str, except: Option<i32>) -> Result<bool> {
        self.column_taken(users::Column::Email, email, except)
            .await
            .context("Failed to check email availability")
    }

    async fn column_taken(
        &self,
        column: users::Column,
        value: &str,
        except: Option<i32>,
    ) -> Result<bool, sea_orm::DbErr> {
        let mut query = Users::find().filter(column.eq(value));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        Ok(query.count(self.db).await? > 0)
    }

    pub async fn create(&self, user: NewUser, password_hash: String) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password: Set(password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            role: Set(Role::User),
            created: Set(now.clone()),
            modified: Set(now),
            ..Default::default()
        };

        let model = active.insert(self.db).await.context("Failed to insert user")?;
        Ok(User::from(model))
    }

    /// Apply a partial update. Returns `None` when the user does not exist.
    pub async fn update(
        &self,
        id: i32,
        changes: UserChanges,
        password_hash: Option<String>,
    ) -> Result<Option<User>> {
        let Some(model) = record::load::<Users, _>(self.db, id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(hash) = password_hash {
            active.password = Set(hash);
        }
        active.modified = Set(chrono::Utc::now().to_rfc3339());

        let saved = record::save(self.db, active).await?;
        let model = saved
            .try_into_model()
            .context("Saved user is missing columns")?;

        Ok(Some(User::from(model)))
    }

    /// Returns false when no user has that username.
    pub async fn set_role(&self, username: &str, role: Role) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::Role, Expr::value(role.to_value()))
            .col_expr(
                users::Column::Modified,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Username.eq(username))
            .exec(self.db)
            .await
            .context("Failed to update user role")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete a user and its meta rows.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        UsersMeta::delete_many()
            .filter(users_meta::Column::UserId.eq(id))
            .exec(self.db)
            .await
            .context("Failed to delete user meta")?;

        record::delete::<Users, _>(self.db, id).await
    }
}
