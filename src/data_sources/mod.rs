//! Read-only data sources.
//!
//! Most data sources resolve a `filter` block to exactly one record with
//! [`run_lookup`](crate::lookup::run_lookup); `vultr_dns_domain` reads a
//! domain by name instead.

pub mod bare_metal_server;
pub mod block_storage;
pub mod dns_domain;
pub mod instance;
pub mod iso_private;
pub mod reverse_ipv4;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::filter::{build_filter_spec, FilterSpec};
use crate::schema::{Attribute, Schema};

/// Parse the `filter` block of a data source configuration.
pub(crate) fn filter_spec(config: &Value) -> Result<FilterSpec, ProviderError> {
    build_filter_spec(config.get("filter"))
}

/// Add computed attributes of each primitive kind to a schema.
pub(crate) fn with_computed(
    schema: Schema,
    strings: &[&str],
    ints: &[&str],
) -> Schema {
    let schema = strings
        .iter()
        .fold(schema, |schema, name| schema.with_attribute(*name, Attribute::computed_string()));
    ints.iter()
        .fold(schema, |schema, name| schema.with_attribute(*name, Attribute::computed_int64()))
}

/// Build the data source state from the configuration and a resolved record.
///
/// The configuration (including `filter`) is kept, every record field the
/// schema declares is copied over, and `id` is set.
pub(crate) fn record_state<T: Serialize>(
    schema: &Schema,
    config: &Value,
    record: &T,
    id: &str,
) -> Result<Value, ProviderError> {
    let mut state = match config {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Value::Object(fields) = serde_json::to_value(record)? {
        for (name, value) in fields {
            if name != "id" && schema.attribute(&name).is_some() {
                state.insert(name, value);
            }
        }
    }
    state.insert("id".to_string(), Value::String(id.to_string()));
    Ok(Value::Object(state))
}
