//! `vultr_dns_domain` data source: reads a domain by name.

use serde_json::Value;

use super::record_state;
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_dns_domain";

/// Data source schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Look up a DNS domain")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("domain", Attribute::required_string())
        .with_attribute("date_created", Attribute::computed_string())
        .with_attribute("dns_sec", Attribute::computed_string())
}

/// Read the domain named in the configuration.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let name = config
        .get("domain")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ProviderError::Validation("attribute 'domain' is required".to_string()))?;
    let domain = client
        .get_domain(ctx, name)
        .await
        .map_err(|err| ProviderError::fetch("error getting dns domains", err))?;
    record_state(&schema(), &config, &domain, &domain.domain)
}
