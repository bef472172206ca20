//! Declarative record filtering.
//!
//! A data source's `filter` blocks are parsed into a [`FilterSpec`]; each
//! candidate record is flattened into a [`FlattenedRecord`] and tested with
//! [`FilterSpec::matches`].
//!
//! Matching rules:
//!
//! - field names compare case-insensitively
//! - values compare as strings, after coercing integers and booleans
//! - float fields compare numerically, so `10`, `10.0` and `1e1` all match
//!   a cost of `10.0`
//! - values listed for one name are OR'd, distinct names are AND'd
//! - a list field matches when any element matches
//! - a field absent from the record never matches

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;

/// A weakly-typed leaf value extracted from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// JSON null / absent optional.
    Null,
    /// A string.
    String(String),
    /// A whole number.
    Integer(i64),
    /// A number with a fractional part (or too large for `i64`).
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// A list of leaf values.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// String form used for comparison. `None` for values that never match.
    pub fn as_filter_string(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
        }
    }

    /// Whether this value satisfies any of `accepted`.
    fn matches_any(&self, accepted: &[String]) -> bool {
        match self {
            Self::List(items) => items.iter().any(|item| item.matches_any(accepted)),
            Self::Float(f) => accepted
                .iter()
                .any(|a| a.trim().parse::<f64>().is_ok_and(|parsed| parsed == *f)),
            scalar => scalar
                .as_filter_string()
                .is_some_and(|s| accepted.iter().any(|a| *a == s)),
        }
    }

    /// Convert a JSON leaf. Nested objects yield `None` and are skipped.
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Boolean(b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(Self::String(s)),
            Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Value::Object(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A record reduced to its top-level fields.
pub type FlattenedRecord = BTreeMap<String, FieldValue>;

/// Records that can be evaluated by the filter engine.
pub trait Flatten {
    /// Decompose the record into named fields.
    fn flatten(&self) -> Result<FlattenedRecord, ProviderError>;
}

/// Flatten a record through its `Serialize` implementation.
///
/// Only top-level fields are kept; nested objects are dropped. The record
/// must serialize to a JSON object.
pub fn flatten_serializable<T: Serialize>(record: &T) -> Result<FlattenedRecord, ProviderError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(name, value)| FieldValue::from_json(value).map(|v| (name, v)))
            .collect()),
        other => Err(ProviderError::Serialization(
            <serde_json::Error as serde::ser::Error>::custom(format!(
                "record serialized to {} instead of an object",
                json_kind(&other)
            )),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One `name = values` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Lower-cased field name.
    pub name: String,
    /// Accepted values; any one matching satisfies the clause.
    pub values: Vec<String>,
}

/// A parsed set of filter clauses. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    clauses: Vec<FilterClause>,
}

impl FilterSpec {
    /// Build a filter from `(name, values)` pairs.
    ///
    /// Repeated names are merged into the first clause with that name.
    pub fn new<I, N, V>(clauses: I) -> Result<Self, ProviderError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut merged: Vec<FilterClause> = Vec::new();
        for (name, values) in clauses {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ProviderError::Validation(
                    "filter name must not be empty".to_string(),
                ));
            }
            let values: Vec<String> = values.into_iter().map(Into::into).collect();
            if values.is_empty() {
                return Err(ProviderError::Validation(format!(
                    "filter '{}' must list at least one value",
                    name
                )));
            }

            let name = name.to_lowercase();
            match merged.iter_mut().find(|clause| clause.name == name) {
                Some(clause) => {
                    for value in values {
                        if !clause.values.contains(&value) {
                            clause.values.push(value);
                        }
                    }
                },
                None => merged.push(FilterClause { name, values }),
            }
        }

        if merged.is_empty() {
            return Err(ProviderError::Validation(
                "at least one filter must be supplied".to_string(),
            ));
        }
        Ok(Self { clauses: merged })
    }

    /// The clauses in declaration order.
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Accepted values for a field, if the filter constrains it.
    pub fn values_for(&self, name: &str) -> Option<&[String]> {
        self.clauses
            .iter()
            .find(|clause| clause.name.eq_ignore_ascii_case(name))
            .map(|clause| clause.values.as_slice())
    }

    /// Whether `record` satisfies every clause.
    pub fn matches(&self, record: &FlattenedRecord) -> bool {
        self.clauses.iter().all(|clause| {
            lookup_field(record, &clause.name).is_some_and(|value| value.matches_any(&clause.values))
        })
    }
}

fn lookup_field<'a>(record: &'a FlattenedRecord, name: &str) -> Option<&'a FieldValue> {
    record.get(name).or_else(|| {
        record
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Parse the `filter` attribute of a data source configuration.
///
/// `raw` is the JSON array of `{ "name": "...", "values": ["..."] }` entries.
pub fn build_filter_spec(raw: Option<&Value>) -> Result<FilterSpec, ProviderError> {
    let entries = match raw {
        None | Some(Value::Null) => {
            return Err(ProviderError::Validation(
                "issue with filter: a filter block is required".to_string(),
            ))
        },
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ProviderError::Validation(
                "issue with filter: expected a list of filter blocks".to_string(),
            ))
        },
    };

    let mut clauses = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Validation(format!("filter.{i}.name must be a string")))?;
        let values = entry
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Validation(format!("filter.{i}.values must be a list")))?;
        let values = values
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    ProviderError::Validation(format!("filter.{i}.values must only hold strings"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        clauses.push((name.to_string(), values));
    }

    FilterSpec::new(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Volume {
        id: String,
        label: String,
        size_gb: i64,
        cost: f64,
        live: bool,
        features: Vec<String>,
        attached_to_instance: Option<String>,
        schedule: Schedule,
    }

    #[derive(Serialize)]
    struct Schedule {
        hour: i64,
    }

    fn volume() -> Volume {
        Volume {
            id: "bs-1".to_string(),
            label: "Foo".to_string(),
            size_gb: 10,
            cost: 1.5,
            live: true,
            features: vec!["ipv6".to_string(), "ddos_protection".to_string()],
            attached_to_instance: None,
            schedule: Schedule { hour: 3 },
        }
    }

    fn spec(name: &str, values: &[&str]) -> FilterSpec {
        FilterSpec::new([(name, values.iter().copied())]).unwrap()
    }

    #[test]
    fn test_flatten_keeps_top_level_leaves() {
        let record = flatten_serializable(&volume()).unwrap();
        assert_eq!(record["label"], FieldValue::from("Foo"));
        assert_eq!(record["size_gb"], FieldValue::Integer(10));
        assert_eq!(record["cost"], FieldValue::Float(1.5));
        assert_eq!(record["live"], FieldValue::Boolean(true));
        assert_eq!(record["attached_to_instance"], FieldValue::Null);
        assert!(matches!(record["features"], FieldValue::List(ref items) if items.len() == 2));
        assert!(!record.contains_key("schedule"));
    }

    #[test]
    fn test_flatten_rejects_non_objects() {
        let err = flatten_serializable(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_field_name_is_case_insensitive() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(spec("Label", &["Foo"]).matches(&record));
        assert!(spec("LABEL", &["Foo"]).matches(&record));
    }

    #[test]
    fn test_value_comparison_is_exact() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(!spec("label", &["foo"]).matches(&record));
    }

    #[test]
    fn test_scalars_are_coerced() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(spec("size_gb", &["10"]).matches(&record));
        assert!(spec("cost", &["1.5"]).matches(&record));
        assert!(spec("live", &["true"]).matches(&record));
        assert!(!spec("live", &["false"]).matches(&record));
    }

    #[test]
    fn test_floats_compare_numerically() {
        let record: FlattenedRecord = [("cost".to_string(), FieldValue::Float(10.0))].into();
        assert!(spec("cost", &["10"]).matches(&record));
        assert!(spec("cost", &["10.0"]).matches(&record));
        assert!(spec("cost", &["10.00"]).matches(&record));
        assert!(!spec("cost", &["10.5"]).matches(&record));
        assert!(!spec("cost", &["ten"]).matches(&record));
    }

    #[test]
    fn test_null_never_matches() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(!spec("attached_to_instance", &["", "null"]).matches(&record));
    }

    #[test]
    fn test_list_matches_any_element() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(spec("features", &["ddos_protection"]).matches(&record));
        assert!(!spec("features", &["auto_backups"]).matches(&record));
    }

    #[test]
    fn test_absent_field_is_non_match() {
        let record = flatten_serializable(&volume()).unwrap();
        assert!(!spec("region", &["ewr"]).matches(&record));
        assert!(!spec("schedule", &["3"]).matches(&record));
    }

    #[test]
    fn test_values_are_ored_and_names_are_anded() {
        let record = flatten_serializable(&volume()).unwrap();

        assert!(spec("label", &["Bar", "Foo"]).matches(&record));

        let both = FilterSpec::new([
            ("label", vec!["Foo"]),
            ("size_gb", vec!["10", "20"]),
        ])
        .unwrap();
        assert!(both.matches(&record));

        let one_fails = FilterSpec::new([("label", vec!["Foo"]), ("size_gb", vec!["20"])]).unwrap();
        assert!(!one_fails.matches(&record));
    }

    #[test]
    fn test_repeated_names_merge() {
        let merged = FilterSpec::new([
            ("label", vec!["a"]),
            ("size_gb", vec!["10"]),
            ("Label", vec!["b", "a"]),
        ])
        .unwrap();

        assert_eq!(merged.clauses().len(), 2);
        assert_eq!(merged.values_for("label"), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn test_spec_construction_errors() {
        let empty: Vec<(&str, Vec<&str>)> = vec![];
        assert!(matches!(
            FilterSpec::new(empty),
            Err(ProviderError::Validation(_))
        ));
        assert!(FilterSpec::new([("", vec!["x"])]).is_err());
        assert!(FilterSpec::new([("label", Vec::<&str>::new())]).is_err());
    }

    #[test]
    fn test_build_from_config() {
        let raw = json!([
            {"name": "label", "values": ["tf-bs-rs-1234"]},
            {"name": "region", "values": ["ewr", "sjc"]}
        ]);
        let spec = build_filter_spec(Some(&raw)).unwrap();
        assert_eq!(spec.clauses().len(), 2);
        assert_eq!(spec.clauses()[1].values, vec!["ewr", "sjc"]);
    }

    #[test]
    fn test_build_requires_filter() {
        assert!(matches!(
            build_filter_spec(None),
            Err(ProviderError::Validation(_))
        ));
        assert!(build_filter_spec(Some(&Value::Null)).is_err());
        assert!(build_filter_spec(Some(&json!([]))).is_err());
        assert!(build_filter_spec(Some(&json!({"name": "label"}))).is_err());
        assert!(build_filter_spec(Some(&json!([{"name": "label"}]))).is_err());
        assert!(build_filter_spec(Some(&json!([{"name": "label", "values": [1]}]))).is_err());
        assert!(build_filter_spec(Some(&json!([{"values": ["x"]}]))).is_err());
    }
}
