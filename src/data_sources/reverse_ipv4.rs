//! `vultr_reverse_ipv4` data source.
//!
//! IPv4 addresses are listed per instance. A filter on `instance_id`
//! restricts the scan to those instances; otherwise every instance in the
//! account is scanned.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{filter_spec, record_state, with_computed};
use crate::client::models::{Instance, Ipv4, ListOptions};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::filter::{flatten_serializable, Flatten, FlattenedRecord};
use crate::lookup::{collect_matches, exactly_one, list_all};
use crate::schema::Schema;

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_reverse_ipv4";

/// Data source schema.
pub fn schema() -> Schema {
    with_computed(
        Schema::v0().with_description("Look up the reverse DNS of an IPv4 address").with_filter(),
        &["id", "instance_id", "ip", "reverse", "netmask", "gateway"],
        &[],
    )
}

/// An address together with the instance it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct InstanceIpv4 {
    instance_id: String,
    #[serde(flatten)]
    ipv4: Ipv4,
}

impl Flatten for InstanceIpv4 {
    fn flatten(&self) -> Result<FlattenedRecord, ProviderError> {
        flatten_serializable(self)
    }
}

async fn instance_ids(ctx: &Context, client: &VultrClient) -> Result<Vec<String>, ProviderError> {
    let instances: Vec<Instance> = list_all(ctx, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (instances, meta) = client.list_instances(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(instances))
        }
    })
    .await?;
    Ok(instances.into_iter().map(|instance| instance.id).collect())
}

/// Resolve the filter to one address across the scanned instances.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let spec = filter_spec(&config)?;
    let ids = match spec.values_for("instance_id") {
        Some(ids) => ids.to_vec(),
        None => instance_ids(ctx, client).await?,
    };
    debug!(instances = ids.len(), "Scanning instance addresses");

    let mut matches = Vec::new();
    for instance_id in &ids {
        let id = instance_id.as_str();
        let found = collect_matches(ctx, &spec, move |cursor| {
            let options = ListOptions::after(cursor);
            async move {
                let (ipv4s, meta) = client.list_ipv4(ctx, id, &options).await?;
                let records = ipv4s
                    .into_iter()
                    .map(|ipv4| InstanceIpv4 {
                        instance_id: id.to_string(),
                        ipv4,
                    })
                    .collect();
                Ok::<_, ProviderError>(meta.page(records))
            }
        })
        .await?;
        matches.extend(found);
    }

    let found = exactly_one(matches)?;
    record_state(&schema(), &config, &found, &found.ipv4.ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FieldValue, FilterSpec};

    #[test]
    fn test_instance_id_is_filterable() {
        let record = InstanceIpv4 {
            instance_id: "inst-1".to_string(),
            ipv4: Ipv4 {
                ip: "192.0.2.5".to_string(),
                kind: "main_ip".to_string(),
                reverse: "host.example.com".to_string(),
                ..Default::default()
            },
        };
        let flat = record.flatten().unwrap();
        assert_eq!(flat["instance_id"], FieldValue::from("inst-1"));
        assert_eq!(flat["type"], FieldValue::from("main_ip"));

        let spec = FilterSpec::new([
            ("instance_id", vec!["inst-1"]),
            ("ip", vec!["192.0.2.5"]),
        ])
        .unwrap();
        assert!(spec.matches(&flat));
    }
}
