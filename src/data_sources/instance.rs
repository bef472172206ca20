//! `vultr_instance` data source, including the backup schedule and the
//! private networks the instance is attached to.

use serde_json::{json, Value};

use super::{filter_spec, record_state, with_computed};
use crate::client::models::{BackupSchedule, Instance, ListOptions, PrivateNetworkAttachment};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::lookup::{list_all, run_lookup};
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_instance";

/// Data source schema.
pub fn schema() -> Schema {
    with_computed(
        Schema::v0().with_description("Look up an instance").with_filter(),
        &[
            "id",
            "os",
            "main_ip",
            "region",
            "plan",
            "date_created",
            "status",
            "netmask_v4",
            "gateway_v4",
            "power_status",
            "server_status",
            "v6_network",
            "v6_main_ip",
            "label",
            "internal_ip",
            "kvm",
            "tag",
            "image_id",
            "firewall_group_id",
            "hostname",
            "backups",
        ],
        &[
            "ram",
            "disk",
            "vcpu_count",
            "allowed_bandwidth",
            "v6_network_size",
            "os_id",
            "app_id",
        ],
    )
    .with_attribute("features", Attribute::computed_string_list())
    .with_attribute("private_network_ids", Attribute::computed_string_list())
    .with_attribute("backups_schedule", Attribute::computed_string_map())
}

fn backups_status(schedule: &BackupSchedule) -> &'static str {
    if schedule.enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn backups_schedule(schedule: &BackupSchedule) -> Value {
    json!({
        "type": schedule.kind,
        "hour": schedule.hour.to_string(),
        "dom": schedule.dom.to_string(),
        "dow": schedule.dow.to_string(),
    })
}

/// Resolve the filter to one instance and fetch its backup schedule and
/// private networks.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let spec = filter_spec(&config)?;
    let instance: Instance = run_lookup(ctx, &spec, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (instances, meta) = client.list_instances(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(instances))
        }
    })
    .await?;

    let schedule = client
        .get_backup_schedule(ctx, &instance.id)
        .await
        .map_err(|err| ProviderError::fetch("error getting backup schedule", err))?;

    let instance_id = instance.id.as_str();
    let networks: Vec<PrivateNetworkAttachment> = list_all(ctx, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (networks, meta) = client
                .list_instance_private_networks(ctx, instance_id, &options)
                .await?;
            Ok::<_, ProviderError>(meta.page(networks))
        }
    })
    .await?;

    let mut state = record_state(&schema(), &config, &instance, &instance.id)?;
    if let Value::Object(map) = &mut state {
        map.insert("backups".to_string(), json!(backups_status(&schedule)));
        map.insert("backups_schedule".to_string(), backups_schedule(&schedule));
        map.insert(
            "private_network_ids".to_string(),
            json!(networks
                .into_iter()
                .map(|network| network.network_id)
                .collect::<Vec<_>>()),
        );
    }
    Ok(state)
}
