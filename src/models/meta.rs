//! Typed values stored in the `users_meta` / `flights_meta` tables.
//!
//! Rows keep the value as JSON text; everything above the repository works
//! with [`MetaValue`] instead.

use serde::Serialize;
use serde_json::{Number, Value};

/// A metadata value. `null` is not a value: a cleared entry is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(Number),
    Text(String),
    /// Arrays and objects, kept as nested JSON.
    Json(Value),
}

impl MetaValue {
    /// Classifies an arbitrary JSON value. `null` maps to `None`.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => Some(Self::Number(n)),
            Value::String(s) => Some(Self::Text(s)),
            nested @ (Value::Array(_) | Value::Object(_)) => Some(Self::Json(nested)),
        }
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Number(n) => Value::Number(n),
            Self::Text(s) => Value::String(s),
            Self::Json(v) => v,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a stored column value. A stored JSON `null` decodes to `None`.
    pub fn decode(raw: &str) -> serde_json::Result<Option<Self>> {
        serde_json::from_str::<Value>(raw).map(Self::from_json)
    }
}

impl From<MetaValue> for Value {
    fn from(value: MetaValue) -> Self {
        value.into_json()
    }
}
