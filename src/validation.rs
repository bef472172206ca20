//! Schema validation helpers.
//!
//! Validates a configuration `serde_json::Value` against a [`Schema`] and
//! reports every problem found as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use vultr_provider::schema::{Schema, Attribute};
//! use vultr_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("region", Attribute::required_string())
//!     .with_attribute("size_gb", Attribute::required_int64());
//!
//! let diagnostics = validate(&schema, &json!({"region": "ewr", "size_gb": 10}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"region": "ewr", "size_gb": "ten"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("size_gb".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, RepeatedBlock, Schema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validate a JSON value against a schema.
///
/// - Required attributes must be present and non-null
/// - Computed attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - String attributes with allowed values must use one of them
/// - Repeated blocks must respect their item bounds, and each entry is
///   validated against the block's attributes
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    match value {
        Value::Object(obj) => {
            validate_attributes(&schema.attributes, obj, "", &mut diagnostics);
            for (name, block) in &schema.blocks {
                validate_repeated_block(block, obj.get(name), name, &mut diagnostics);
            }
        },
        Value::Null => {},
        other => diagnostics.push(
            Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(other))),
        ),
    }
    diagnostics
}

/// Validate a JSON value against a schema, returning Err with the diagnostics if invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attributes(
    attributes: &BTreeMap<String, Attribute>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr) in attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.is_computed() {
        return;
    }

    let Some(value) = value.filter(|v| !v.is_null()) else {
        if attr.is_required() {
            diagnostics.push(
                Diagnostic::error(format!("Missing required attribute '{}'", path))
                    .with_detail("This attribute is required and must be provided")
                    .with_attribute(path),
            );
        }
        return;
    };

    validate_attribute_type(&attr.attr_type, value, path, diagnostics);
    if let (false, Some(s)) = (attr.allowed_values.is_empty(), value.as_str()) {
        if !attr.allowed_values.iter().any(|allowed| allowed == s) {
            diagnostics.push(
                Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                    .with_detail(format!(
                        "Expected one of [{}], got '{}'",
                        attr.allowed_values.join(", "),
                        s
                    ))
                    .with_attribute(path),
            );
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let matches = match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::List(element_type) => match value.as_array() {
            Some(arr) => {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
                true
            },
            None => false,
        },
        AttributeType::Map(value_type) => match value.as_object() {
            Some(obj) => {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
                true
            },
            None => false,
        },
    };
    if !matches {
        diagnostics.push(type_error(path, attr_type.name(), value));
    }
}

fn validate_repeated_block(
    block: &RepeatedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let entries: &[Value] = match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(arr)) => arr,
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
            return;
        },
    };

    if entries.len() < block.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path,
                block.min_items,
                entries.len()
            ))
            .with_attribute(path),
        );
    }
    if let Some(max) = block.max_items.filter(|max| entries.len() > *max) {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path,
                max,
                entries.len()
            ))
            .with_attribute(path),
        );
    }

    for (i, entry) in entries.iter().enumerate() {
        let entry_path = format!("{}.{}", path, i);
        match entry {
            Value::Object(obj) => validate_attributes(&block.attributes, obj, &entry_path, diagnostics),
            other => diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(other)))
                    .with_attribute(entry_path),
            ),
        }
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.as_i64().is_some()
                || n.as_f64()
                    .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
