//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::auth::password;
use crate::auth::token::TokenIssuer;
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::user::User;
use crate::services::auth_service::{
    ApiPrincipal, AuthError, AuthService, LoginResult,
};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenIssuer,
    security: SecurityConfig,
    /// Verified against when the account is unknown, so both failure paths
    /// pay for one Argon2 run.
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens: TokenIssuer::from_config(&security),
            security,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Runs a verification that cannot succeed and returns the failure.
    async fn reject_unknown(&self, password: &str) -> AuthError {
        let dummy = match self
            .dummy_hash
            .get_or_try_init(|| {
                password::hash_password_blocking("brink-dummy".to_string(), self.security.clone())
            })
            .await
        {
            Ok(dummy) => dummy.clone(),
            Err(err) => return err.into(),
        };

        match password::verify_password_blocking(password.to_string(), dummy).await {
            Ok(_) => AuthError::InvalidCredentials,
            Err(err) => err.into(),
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, hash)) = self.store.users().get_with_password(username).await? else {
            return Err(self.reject_unknown(password).await);
        };

        if !password::verify_password_blocking(password.to_string(), hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(user.id)?;
        Ok(LoginResult { user, token })
    }

    fn issue_token(&self, user_id: i32) -> Result<String, AuthError> {
        Ok(self.tokens.issue(user_id)?)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(password::hash_password_blocking(password.to_string(), self.security.clone()).await?)
    }

    async fn resolve_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;

        self.store
            .users()
            .get(claims.identity)
            .await?
            .ok_or_else(|| AuthError::token("User does not exist"))
    }

    async fn verify_api_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ApiPrincipal, AuthError> {
        let Some(api_user) = self.store.api_users().get_by_username(username).await? else {
            return Err(self.reject_unknown(password).await);
        };

        if !password::verify_password_blocking(password.to_string(), api_user.password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(ApiPrincipal {
            id: api_user.id,
            username: api_user.username,
        })
    }
}
