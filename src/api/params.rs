//! Loose JSON request bodies.
//!
//! Clients send flat JSON objects. Anything that is not an object is treated
//! as an empty parameter set, and presence checks happen per handler.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::ApiError;

pub type Params = Map<String, Value>;

#[derive(Debug, Default)]
pub struct JsonParams(pub Params);

impl<S> FromRequest<S> for JsonParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        let params = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(Self(params))
    }
}

/// `axum::extract::Path` that rejects with an [`ApiError`] body.
#[derive(Debug)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string as a loose parameter map. Every value arrives as a string.
#[derive(Debug, Default)]
pub struct QueryParams(pub Params);

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(query) =
            axum::extract::Query::<HashMap<String, String>>::from_request_parts(parts, state)
                .await?;

        Ok(Self(
            query
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        ))
    }
}

impl JsonParams {
    /// Fail on the first missing `require` key, then drop `ignore` keys.
    pub fn get_params(self, require: &[&str], ignore: &[&str]) -> Result<Params, ApiError> {
        let mut params = self.0;

        if let Some(missing) = require.iter().find(|key| !params.contains_key(**key)) {
            return Err(ApiError::validation(format!(
                "'{missing}' is a required parameter."
            )));
        }

        for key in ignore {
            params.remove(*key);
        }

        Ok(params)
    }
}

pub fn required_str(params: &Params, key: &str) -> Result<String, ApiError> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::validation(format!("'{key}' must be a string."))),
        None => Err(ApiError::validation(format!(
            "'{key}' is a required parameter."
        ))),
    }
}

/// `None` when absent or null.
pub fn optional_str(params: &Params, key: &str) -> Result<Option<String>, ApiError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_str(params, key).map(Some),
    }
}

/// Integer parameter, ignoring values of the wrong type.
#[must_use]
pub fn loose_i64(params: &Params, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decode a (filtered) parameter map into a typed struct.
pub fn decode<T: DeserializeOwned>(params: Params) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(params))
        .map_err(|e| ApiError::validation(format!("Invalid parameters: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    async fn extract(body: &'static str) -> JsonParams {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap();
        JsonParams::from_request(request, &()).await.unwrap()
    }

    fn params(value: Value) -> JsonParams {
        match value {
            Value::Object(map) => JsonParams(map),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn non_object_bodies_are_empty() {
        assert!(extract("[1, 2, 3]").await.0.is_empty());
        assert!(extract("not json").await.0.is_empty());
        assert!(extract("").await.0.is_empty());
        assert_eq!(extract(r#"{"a": 1}"#).await.0.len(), 1);
    }

    #[test]
    fn names_the_first_missing_key() {
        let err = params(json!({"username": "kite"}))
            .get_params(&["username", "password", "email"], &[])
            .unwrap_err();
        assert_eq!(err.message(), "'password' is a required parameter.");
    }

    #[test]
    fn strips_ignored_keys() {
        let out = params(json!({"a": 1, "b": 2, "c": 3}))
            .get_params(&["a"], &["b", "zzz"])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(!out.contains_key("b"));
    }

    #[test]
    fn typed_accessors() {
        let p = params(json!({"name": "x", "n": 5, "s": "7", "bad": [], "nil": null})).0;

        assert_eq!(required_str(&p, "name").unwrap(), "x");
        assert!(required_str(&p, "n").is_err());
        assert_eq!(optional_str(&p, "nil").unwrap(), None);
        assert_eq!(loose_i64(&p, "n"), Some(5));
        assert_eq!(loose_i64(&p, "s"), Some(7));
        assert_eq!(loose_i64(&p, "bad"), None);
    }

    #[tokio::test]
    async fn query_values_parse_loosely() {
        let (mut parts, ()) = Request::builder()
            .uri("/data?page=abc&per_page=5")
            .body(())
            .unwrap()
            .into_parts();

        let QueryParams(query) = QueryParams::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(loose_i64(&query, "page"), None);
        assert_eq!(loose_i64(&query, "per_page"), Some(5));
    }
}
