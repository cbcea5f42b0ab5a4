use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password cannot be empty!")]
    Empty,

    #[error("Invalid Argon2 params: {0}")]
    Params(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Password task failed: {0}")]
    Task(#[from] task::JoinError),
}

fn hasher(config: &SecurityConfig) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| PasswordError::Params(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. Params are read from the
/// hash itself, so hashes made with older settings still verify.
/// A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// Argon2 is CPU-bound; keep it off the async workers.

pub async fn hash_password_blocking(
    password: String,
    config: SecurityConfig,
) -> Result<String, PasswordError> {
    task::spawn_blocking(move || hash_password(&password, &config)).await?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    Ok(task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse", &fast_config()).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = hash_password("", &fast_config()).unwrap_err();
        assert_eq!(err.to_string(), "Password cannot be empty!");
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "plaintext"));
    }

    #[tokio::test]
    async fn blocking_wrappers() {
        let hash = hash_password_blocking("pw".to_string(), fast_config())
            .await
            .unwrap();
        assert!(verify_password_blocking("pw".to_string(), hash).await.unwrap());
    }
}
