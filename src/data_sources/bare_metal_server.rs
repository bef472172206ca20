//! `vultr_bare_metal_server` data source.

use serde_json::Value;

use super::{filter_spec, record_state, with_computed};
use crate::client::models::{BareMetalServer, ListOptions};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::lookup::run_lookup;
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_bare_metal_server";

/// Data source schema.
pub fn schema() -> Schema {
    with_computed(
        Schema::v0().with_description("Look up a bare-metal server").with_filter(),
        &[
            "id",
            "os",
            "ram",
            "disk",
            "main_ip",
            "region",
            "date_created",
            "status",
            "netmask_v4",
            "gateway_v4",
            "plan",
            "label",
            "tag",
            "image_id",
            "v6_network",
            "v6_main_ip",
        ],
        &["cpu_count", "mac_address", "os_id", "app_id", "v6_network_size"],
    )
    .with_attribute("features", Attribute::computed_string_list())
}

/// Resolve the filter to one server.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let spec = filter_spec(&config)?;
    let server: BareMetalServer = run_lookup(ctx, &spec, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (servers, meta) = client.list_bare_metals(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(servers))
        }
    })
    .await?;
    record_state(&schema(), &config, &server, &server.id)
}
