//! Attribute schemas for the provider configuration, resources and data sources.
//!
//! A [`Schema`] is a flat map of attributes plus any repeated blocks (the
//! `filter` block of lookup data sources). Validation ([`crate::validation`])
//! and the plan diff ([`crate::plan`]) are both driven from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string.
    String,
    /// A 64-bit integer; whole floats are accepted.
    Int64,
    /// Any JSON number.
    Float64,
    /// A boolean.
    Bool,
    /// A list whose elements share one type.
    List(Box<AttributeType>),
    /// A string-keyed map whose values share one type.
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// A list of `element`.
    pub fn list(element: AttributeType) -> Self {
        Self::List(Box::new(element))
    }

    /// A map of `element`.
    pub fn map(element: AttributeType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

/// Who supplies an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Must be set in configuration.
    Required,
    /// May be set in configuration.
    Optional,
    /// Set by the provider only.
    Computed,
}

/// One attribute of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Value type.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Who supplies the value.
    pub presence: Presence,
    /// Hidden from logs and plan output.
    #[serde(default)]
    pub sensitive: bool,
    /// A change replaces the resource instead of updating it.
    #[serde(default)]
    pub force_new: bool,
    /// Value applied when configuration leaves the attribute unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Accepted string values; empty means any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    /// An attribute of `attr_type` supplied as `presence` says.
    pub fn new(attr_type: AttributeType, presence: Presence) -> Self {
        Self {
            attr_type,
            presence,
            sensitive: false,
            force_new: false,
            default: None,
            allowed_values: Vec::new(),
            description: None,
        }
    }

    /// Required string.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, Presence::Required)
    }

    /// Optional string.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, Presence::Optional)
    }

    /// Provider-set string.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, Presence::Computed)
    }

    /// Required integer.
    pub fn required_int64() -> Self {
        Self::new(AttributeType::Int64, Presence::Required)
    }

    /// Optional integer.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, Presence::Optional)
    }

    /// Provider-set integer.
    pub fn computed_int64() -> Self {
        Self::new(AttributeType::Int64, Presence::Computed)
    }

    /// Provider-set number.
    pub fn computed_float64() -> Self {
        Self::new(AttributeType::Float64, Presence::Computed)
    }

    /// Optional boolean.
    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, Presence::Optional)
    }

    /// Provider-set list of strings.
    pub fn computed_string_list() -> Self {
        Self::new(AttributeType::list(AttributeType::String), Presence::Computed)
    }

    /// Provider-set map of strings.
    pub fn computed_string_map() -> Self {
        Self::new(AttributeType::map(AttributeType::String), Presence::Computed)
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the resource when this attribute changes.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Fill in `default` when configuration leaves the attribute unset.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict a string attribute to `values`.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Must be set in configuration.
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Set by the provider only.
    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    /// Whether `value` leaves this attribute unset.
    ///
    /// Null and absent values are unset. For string attributes the API
    /// reports "not set" as `""`, so an empty string is unset too.
    pub fn is_unset(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => self.attr_type == AttributeType::String && s.is_empty(),
            Some(_) => false,
        }
    }
}

/// A block that may appear any number of times, such as `filter`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepeatedBlock {
    /// Attributes of each entry.
    pub attributes: BTreeMap<String, Attribute>,
    /// Fewest entries accepted.
    #[serde(default)]
    pub min_items: usize,
    /// Most entries accepted, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl RepeatedBlock {
    /// An unbounded block with no attributes yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to each entry.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Require at least `min` entries.
    pub fn with_min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    /// Allow at most `max` entries.
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// Schema of a resource, a data source or the provider configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// State format version.
    #[serde(default)]
    pub version: u64,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    /// Repeated blocks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, RepeatedBlock>,
}

impl Schema {
    /// An empty schema at state version 0.
    pub fn v0() -> Self {
        Self::default()
    }

    /// Add a top-level attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Add a repeated block.
    pub fn with_block(mut self, name: impl Into<String>, block: RepeatedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add the `filter` block shared by lookup data sources.
    ///
    /// Each entry is `{ name = "...", values = ["..."] }`; at least one entry
    /// is required.
    pub fn with_filter(self) -> Self {
        self.with_block(
            "filter",
            RepeatedBlock::new()
                .with_attribute(
                    "name",
                    Attribute::required_string().with_description("Record field to match"),
                )
                .with_attribute(
                    "values",
                    Attribute::new(AttributeType::list(AttributeType::String), Presence::Required)
                        .with_description("Accepted values; any one of them must match"),
                )
                .with_min_items(1),
        )
    }

    /// Look up a top-level attribute.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

/// Every schema the provider serves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderSchema {
    /// Provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Resource schemas by type name.
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    /// Data source schemas by type name.
    #[serde(default)]
    pub data_sources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    /// No schemas yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Register a resource type.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Register a data source type.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// The operation cannot proceed.
    Error,
    /// Worth reporting, but not fatal.
    Warning,
}

/// A problem found in configuration, reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: DiagnosticSeverity,
    /// One-line summary.
    pub summary: String,
    /// Longer explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Dotted path of the offending attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    fn new(severity: DiagnosticSeverity, summary: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// An error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, summary)
    }

    /// A warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, summary)
    }

    /// Attach a longer explanation.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Point at the offending attribute.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
