//! Managed resources.
//!
//! Each submodule exposes its type name, its schema, and the CRUD
//! operations the provider dispatches to.

pub mod block_storage;
pub mod dns_domain;
pub mod iso_private;

use serde_json::{Map, Value};

use crate::error::ProviderError;

/// A string attribute of a state object, treating `""` as unset.
pub(crate) fn optional_str<'a>(state: &'a Value, name: &str) -> Option<&'a str> {
    state
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// A required, non-empty string attribute.
pub(crate) fn required_str<'a>(state: &'a Value, name: &str) -> Result<&'a str, ProviderError> {
    optional_str(state, name)
        .ok_or_else(|| ProviderError::Validation(format!("attribute '{name}' is required")))
}

/// A required integer attribute; whole floats are accepted.
pub(crate) fn required_i64(state: &Value, name: &str) -> Result<i64, ProviderError> {
    optional_i64(state, name)
        .ok_or_else(|| ProviderError::Validation(format!("attribute '{name}' must be an integer")))
}

/// An optional integer attribute; whole floats are accepted.
pub(crate) fn optional_i64(state: &Value, name: &str) -> Option<i64> {
    let value = state.get(name)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// An optional boolean attribute.
pub(crate) fn optional_bool(state: &Value, name: &str) -> Option<bool> {
    state.get(name).and_then(Value::as_bool)
}

/// The id of an existing resource.
pub(crate) fn state_id(state: &Value) -> Result<&str, ProviderError> {
    optional_str(state, "id")
        .ok_or_else(|| ProviderError::Validation("resource state has no id".to_string()))
}

/// Start a state object from the attributes the user controls.
pub(crate) fn carry_over(state: &Value, names: &[&str]) -> Map<String, Value> {
    names
        .iter()
        .filter_map(|name| state.get(*name).map(|value| (name.to_string(), value.clone())))
        .collect()
}
