use super::ApiError;
use super::params::Params;

pub const MAX_USERNAME_LEN: usize = 255;
pub const MAX_META_KEY_LEN: usize = 255;

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {MAX_USERNAME_LEN} characters or less"
        )));
    }

    Ok(username)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

    if !valid {
        return Err(ApiError::validation(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

pub fn validate_meta_key(key: &str) -> Result<&str, ApiError> {
    if key.is_empty() {
        return Err(ApiError::validation("Meta key cannot be empty"));
    }

    if key.len() > MAX_META_KEY_LEN {
        return Err(ApiError::validation(format!(
            "Meta key must be {MAX_META_KEY_LEN} characters or less"
        )));
    }

    Ok(key)
}

/// The `keys` member of a meta lookup body. Non-string entries never match
/// a stored key, so they are dropped.
pub fn validate_meta_keys(params: &Params) -> Result<Vec<String>, ApiError> {
    match params.get("keys") {
        Some(serde_json::Value::Array(items)) => Ok(items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()),
        _ => Err(ApiError::validation("keys must be provided as an array")),
    }
}
