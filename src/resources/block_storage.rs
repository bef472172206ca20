//! `vultr_block_storage`: a block storage volume, optionally attached to an
//! instance.

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{carry_over, optional_bool, optional_i64, optional_str, required_i64, required_str, state_id};
use crate::client::models::{
    AttachBlockRequest, BlockStorage, CreateBlockRequest, DetachBlockRequest, UpdateBlockRequest,
};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::poll::{StateWaiter, WaitSettings};
use crate::schema::{Attribute, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "vultr_block_storage";

const ATTACHED: &str = "attached";
const DETACHED: &str = "detached";

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("A block storage volume")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "region",
            Attribute::required_string()
                .with_force_new()
                .with_description("Region the volume is created in"),
        )
        .with_attribute(
            "size_gb",
            Attribute::required_int64().with_description("Size of the volume in GB"),
        )
        .with_attribute("label", Attribute::optional_string())
        .with_attribute(
            "attached_to_instance",
            Attribute::optional_string().with_description("Instance the volume is attached to"),
        )
        .with_attribute(
            "live",
            Attribute::optional_bool()
                .with_default(json!(false))
                .with_description("Attach and detach without restarting the instance"),
        )
        .with_attribute("date_created", Attribute::computed_string())
        .with_attribute("cost", Attribute::computed_float64())
        .with_attribute("status", Attribute::computed_string())
        .with_attribute("mount_id", Attribute::computed_string())
}

fn to_state(block: BlockStorage, previous: &Value) -> Value {
    let mut state = carry_over(previous, &["live"]);
    state.insert("id".to_string(), json!(block.id));
    state.insert("region".to_string(), json!(block.region));
    state.insert("size_gb".to_string(), json!(block.size_gb));
    state.insert("label".to_string(), json!(block.label));
    state.insert(
        "attached_to_instance".to_string(),
        json!(block.attached_to_instance),
    );
    state.insert("date_created".to_string(), json!(block.date_created));
    state.insert("cost".to_string(), json!(block.cost));
    state.insert("status".to_string(), json!(block.status));
    state.insert("mount_id".to_string(), json!(block.mount_id));
    state.entry("live").or_insert(json!(false));
    Value::Object(state)
}

async fn wait_active(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    id: &str,
) -> Result<(), ProviderError> {
    StateWaiter::new("active", ["pending"])
        .with_settings(*wait)
        .wait(ctx, move || async move {
            let block = client.get_block(ctx, id).await?;
            let status = block.status.clone();
            Ok::<_, ProviderError>(Some(((), status)))
        })
        .await
}

/// Wait until the volume's attachment matches `instance` (`None` = detached).
async fn wait_attachment(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    id: &str,
    instance: Option<&str>,
) -> Result<(), ProviderError> {
    let (target, pending) = match instance {
        Some(_) => (ATTACHED, DETACHED),
        None => (DETACHED, ATTACHED),
    };
    StateWaiter::new(target, [pending])
        .with_settings(*wait)
        .wait(ctx, move || async move {
            let block = client.get_block(ctx, id).await?;
            let attached = match instance {
                Some(instance) => block.attached_to_instance == instance,
                None => !block.attached_to_instance.is_empty(),
            };
            let observed = if attached { ATTACHED } else { DETACHED };
            Ok::<_, ProviderError>(Some(((), observed.to_string())))
        })
        .await
}

async fn attach(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    id: &str,
    instance: &str,
    live: bool,
) -> Result<(), ProviderError> {
    info!(block = %id, instance = %instance, live, "Attaching block storage");
    let request = AttachBlockRequest {
        instance_id: instance.to_string(),
        live,
    };
    client.attach_block(ctx, id, &request).await?;
    wait_attachment(ctx, client, wait, id, Some(instance)).await
}

async fn detach(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    id: &str,
    live: bool,
) -> Result<(), ProviderError> {
    info!(block = %id, live, "Detaching block storage");
    client.detach_block(ctx, id, &DetachBlockRequest { live }).await?;
    wait_attachment(ctx, client, wait, id, None).await
}

/// Create the volume, wait for it to become active, and attach it if asked.
///
/// Any failure after the volume exists yields
/// [`ProviderError::PartialCreate`] carrying its id.
pub async fn create(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    planned: Value,
) -> Result<Value, ProviderError> {
    let request = CreateBlockRequest {
        region: required_str(&planned, "region")?.to_string(),
        size_gb: required_i64(&planned, "size_gb")?,
        label: optional_str(&planned, "label").map(str::to_string),
    };
    info!(region = %request.region, size_gb = request.size_gb, "Creating block storage");
    let block = client.create_block(ctx, &request).await?;
    let id = block.id.clone();

    let finished = async {
        wait_active(ctx, client, wait, &id).await?;
        if let Some(instance) = optional_str(&planned, "attached_to_instance") {
            let live = optional_bool(&planned, "live").unwrap_or(false);
            attach(ctx, client, wait, &id, instance, live).await?;
        }
        let block = client.get_block(ctx, &id).await?;
        Ok::<_, ProviderError>(to_state(block, &planned))
    }
    .await;

    finished.map_err(|err| ProviderError::PartialCreate {
        id: id.clone(),
        source: Box::new(err),
    })
}

/// Refresh the volume; `Value::Null` when it no longer exists.
pub async fn read(ctx: &Context, client: &VultrClient, current: Value) -> Result<Value, ProviderError> {
    let id = state_id(&current)?;
    match client.get_block(ctx, id).await {
        Ok(block) => Ok(to_state(block, &current)),
        Err(err) if err.is_not_found() => {
            warn!(block = %id, "Removing block storage because it is gone");
            Ok(Value::Null)
        },
        Err(err) => Err(err),
    }
}

/// Apply label, size and attachment changes.
pub async fn update(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let id = state_id(&prior)?.to_string();
    let live = optional_bool(&planned, "live").unwrap_or(false);

    let mut request = UpdateBlockRequest::default();
    let size_gb = optional_i64(&planned, "size_gb");
    if size_gb != optional_i64(&prior, "size_gb") {
        request.size_gb = size_gb;
    }
    let label = optional_str(&planned, "label");
    if label != optional_str(&prior, "label") {
        request.label = Some(label.unwrap_or_default().to_string());
    }
    if request != UpdateBlockRequest::default() {
        info!(block = %id, "Updating block storage");
        client.update_block(ctx, &id, &request).await?;
    }

    let before = optional_str(&prior, "attached_to_instance");
    let after = optional_str(&planned, "attached_to_instance");
    if before != after {
        if before.is_some() {
            detach(ctx, client, wait, &id, live).await?;
        }
        if let Some(instance) = after {
            attach(ctx, client, wait, &id, instance, live).await?;
        }
    }

    let block = client.get_block(ctx, &id).await?;
    Ok(to_state(block, &planned))
}

/// Detach the volume if needed, then delete it.
pub async fn delete(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    current: Value,
) -> Result<(), ProviderError> {
    let id = state_id(&current)?;
    let block = match client.get_block(ctx, id).await {
        Ok(block) => block,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err),
    };
    if !block.attached_to_instance.is_empty() {
        let live = optional_bool(&current, "live").unwrap_or(false);
        detach(ctx, client, wait, id, live).await?;
    }

    info!(block = %id, "Deleting block storage");
    match client.delete_block(ctx, id).await {
        Err(err) if err.is_not_found() => Ok(()),
        result => result,
    }
}

/// Import a volume by id.
pub async fn import(ctx: &Context, client: &VultrClient, id: &str) -> Result<Value, ProviderError> {
    let block = client.get_block(ctx, id).await?;
    Ok(to_state(block, &Value::Null))
}
