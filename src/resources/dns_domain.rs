//! `vultr_dns_domain`: a DNS zone hosted by Vultr.

use std::net::IpAddr;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{carry_over, optional_str, required_str, state_id};
use crate::client::models::{CreateDomainRequest, Domain, UpdateDomainRequest};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "vultr_dns_domain";

const DNS_SEC_VALUES: [&str; 2] = ["disabled", "enabled"];

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("A DNS domain")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "domain",
            Attribute::required_string()
                .with_force_new()
                .with_description("Name of the domain"),
        )
        .with_attribute(
            "ip",
            Attribute::optional_string()
                .with_force_new()
                .with_description("IP address for the default A record"),
        )
        .with_attribute(
            "dns_sec",
            Attribute::optional_string()
                .with_default(json!("disabled"))
                .with_allowed_values(DNS_SEC_VALUES),
        )
        .with_attribute("date_created", Attribute::computed_string())
}

/// Checks the schema cannot express.
pub fn validate_config(config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if config.get("domain").and_then(Value::as_str) == Some("") {
        diagnostics.push(Diagnostic::error("domain must not be empty").with_attribute("domain"));
    }
    if let Some(ip) = optional_str(config, "ip") {
        if ip.parse::<IpAddr>().is_err() {
            diagnostics.push(
                Diagnostic::error(format!("expected ip to contain a valid IP, got: {ip}"))
                    .with_attribute("ip"),
            );
        }
    }
    diagnostics
}

fn to_state(domain: Domain, previous: &Value) -> Value {
    let mut state = carry_over(previous, &["ip"]);
    state.insert("id".to_string(), json!(domain.domain));
    state.insert("domain".to_string(), json!(domain.domain));
    state.insert("dns_sec".to_string(), json!(domain.dns_sec));
    state.insert("date_created".to_string(), json!(domain.date_created));
    Value::Object(state)
}

/// Create the domain and read it back.
pub async fn create(ctx: &Context, client: &VultrClient, planned: Value) -> Result<Value, ProviderError> {
    if let Some(diagnostic) = validate_config(&planned).into_iter().next() {
        return Err(ProviderError::Validation(diagnostic.summary));
    }
    let request = CreateDomainRequest {
        domain: required_str(&planned, "domain")?.to_string(),
        ip: optional_str(&planned, "ip").map(str::to_string),
        dns_sec: optional_str(&planned, "dns_sec")
            .unwrap_or("disabled")
            .to_string(),
    };

    info!(domain = %request.domain, "Creating domain");
    let domain = client.create_domain(ctx, &request).await?;
    let mut state = planned;
    if let Value::Object(map) = &mut state {
        map.insert("id".to_string(), json!(domain.domain));
    }
    read(ctx, client, state).await
}

/// Refresh the domain; `Value::Null` when it no longer exists.
pub async fn read(ctx: &Context, client: &VultrClient, current: Value) -> Result<Value, ProviderError> {
    let id = state_id(&current)?;
    match client.get_domain(ctx, id).await {
        Ok(domain) => Ok(to_state(domain, &current)),
        Err(err) if err.is_not_found() => {
            warn!(domain = %id, "Removing domain because it is gone");
            Ok(Value::Null)
        },
        Err(err) => Err(err),
    }
}

/// Apply a DNSSEC change.
pub async fn update(
    ctx: &Context,
    client: &VultrClient,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let id = state_id(&prior)?.to_string();
    let dns_sec = optional_str(&planned, "dns_sec").unwrap_or("disabled");
    if optional_str(&prior, "dns_sec") != Some(dns_sec) {
        info!(domain = %id, dns_sec, "Updating domain");
        let request = UpdateDomainRequest {
            dns_sec: dns_sec.to_string(),
        };
        client.update_domain(ctx, &id, &request).await?;
    }

    let mut state = planned;
    if let Value::Object(map) = &mut state {
        map.insert("id".to_string(), json!(id));
    }
    read(ctx, client, state).await
}

/// Delete the domain.
pub async fn delete(ctx: &Context, client: &VultrClient, current: Value) -> Result<(), ProviderError> {
    let id = state_id(&current)?;
    info!(domain = %id, "Deleting domain");
    match client.delete_domain(ctx, id).await {
        Err(err) if err.is_not_found() => Ok(()),
        result => result,
    }
}

/// Import a domain by name.
pub async fn import(ctx: &Context, client: &VultrClient, id: &str) -> Result<Value, ProviderError> {
    let domain = client.get_domain(ctx, id).await?;
    Ok(to_state(domain, &Value::Null))
}
