//! Response shaping: JSON-compatible encoding and field filtering.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Encodes a model into its JSON-compatible form: dates become RFC 3339
/// strings, durations seconds, sets arrays.
pub fn encode<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("encoding failed: {e}")))
}

/// Keeps only the keys of `encoded` that were present in `input`.
pub fn exclude_unset(encoded: Value, input: &Value) -> Value {
    match (encoded, input.as_object()) {
        (Value::Object(map), Some(set)) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| set.contains_key(key))
                .collect(),
        ),
        (encoded, _) => encoded,
    }
}

pub fn include_only(encoded: Value, keys: &[&str]) -> Value {
    retain(encoded, |key| keys.contains(&key))
}

pub fn exclude(encoded: Value, keys: &[&str]) -> Value {
    retain(encoded, |key| !keys.contains(&key))
}

fn retain(encoded: Value, keep: impl Fn(&str) -> bool) -> Value {
    match encoded {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| keep(key))
                .collect::<Map<_, _>>(),
        ),
        other => other,
    }
}

/// Overlays the keys of `update` on `base`.
pub fn merge(base: Value, update: Value) -> Value {
    match (base, update) {
        (Value::Object(mut base), Value::Object(update)) => {
            base.extend(update);
            Value::Object(base)
        }
        (base, _) => base,
    }
}
