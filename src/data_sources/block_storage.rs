//! `vultr_block_storage` data source.

use serde_json::Value;

use super::{filter_spec, record_state, with_computed};
use crate::client::models::{BlockStorage, ListOptions};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::lookup::run_lookup;
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_block_storage";

/// Data source schema.
pub fn schema() -> Schema {
    with_computed(
        Schema::v0().with_description("Look up a block storage volume").with_filter(),
        &["id", "date_created", "status", "region", "attached_to_instance", "label", "mount_id"],
        &["size_gb"],
    )
    .with_attribute("cost", Attribute::computed_float64())
}

/// Resolve the filter to one volume.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let spec = filter_spec(&config)?;
    let block: BlockStorage = run_lookup(ctx, &spec, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (blocks, meta) = client.list_blocks(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(blocks))
        }
    })
    .await?;
    record_state(&schema(), &config, &block, &block.id)
}
