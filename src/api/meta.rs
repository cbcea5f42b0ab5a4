//! Request/response shaping shared by the user and flight meta endpoints.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::ApiError;
use super::params::Params;
use super::validation::validate_meta_key;
use crate::models::meta::MetaValue;

/// Every body member becomes one meta entry. `null` clears the value.
pub fn meta_values(params: Params) -> Result<Vec<(String, Option<MetaValue>)>, ApiError> {
    params
        .into_iter()
        .map(|(key, value)| {
            validate_meta_key(&key)?;
            Ok((key, MetaValue::from_json(value)))
        })
        .collect()
}

/// Stored values as a JSON object. Cleared entries render as `null`.
#[must_use]
pub fn meta_object(values: BTreeMap<String, Option<MetaValue>>) -> Map<String, Value> {
    values
        .into_iter()
        .map(|(key, value)| (key, value.map_or(Value::Null, MetaValue::into_json)))
        .collect()
}
