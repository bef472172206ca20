//! `vultr_iso_private` data source.

use serde_json::Value;

use super::{filter_spec, record_state, with_computed};
use crate::client::models::{Iso, ListOptions};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::lookup::run_lookup;
use crate::schema::Schema;

/// Data source type name.
pub const TYPE_NAME: &str = "vultr_iso_private";

/// Data source schema.
pub fn schema() -> Schema {
    with_computed(
        Schema::v0().with_description("Look up a private ISO").with_filter(),
        &["id", "date_created", "filename", "md5sum", "sha512sum", "status"],
        &["size"],
    )
}

/// Resolve the filter to one ISO.
pub async fn read(ctx: &Context, client: &VultrClient, config: Value) -> Result<Value, ProviderError> {
    let spec = filter_spec(&config)?;
    let iso: Iso = run_lookup(ctx, &spec, move |cursor| {
        let options = ListOptions::after(cursor);
        async move {
            let (isos, meta) = client.list_isos(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(isos))
        }
    })
    .await?;
    record_state(&schema(), &config, &iso, &iso.id)
}
