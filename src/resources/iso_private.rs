//! `vultr_iso_private`: an ISO image downloaded into the account.
//!
//! Creation returns immediately with a `pending` ISO; the resource waits
//! until the download is `complete`. Deleting an ISO that is mounted on an
//! instance fails with an "is still attached to <ip>" error, so delete
//! detaches it from each blocking instance in turn and retries.

use std::collections::HashSet;
use std::net::IpAddr;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{carry_over, required_str, state_id};
use crate::client::models::{CreateIsoRequest, Instance, Iso, ListOptions};
use crate::client::VultrClient;
use crate::context::Context;
use crate::error::ProviderError;
use crate::filter::FilterSpec;
use crate::lookup::run_lookup;
use crate::poll::{StateWaiter, WaitSettings};
use crate::schema::{Attribute, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "vultr_iso_private";

/// Upper bound on blocking attachments resolved by a single delete.
pub const MAX_DETACH_ATTEMPTS: usize = 8;

const ATTACHED_MARKER: &str = "is still attached to";

/// Page size used when scanning instances for the blocking attachment.
const INSTANCE_PAGE_SIZE: u32 = 50;

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("A private ISO image")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "url",
            Attribute::required_string()
                .with_force_new()
                .with_description("URL the ISO is downloaded from"),
        )
        .with_attribute("date_created", Attribute::computed_string())
        .with_attribute("filename", Attribute::computed_string())
        .with_attribute("size", Attribute::computed_int64())
        .with_attribute("md5sum", Attribute::computed_string())
        .with_attribute("sha512sum", Attribute::computed_string())
        .with_attribute("status", Attribute::computed_string())
}

fn to_state(iso: Iso, previous: &Value) -> Value {
    let mut state = carry_over(previous, &["url"]);
    state.insert("id".to_string(), json!(iso.id));
    state.insert("date_created".to_string(), json!(iso.date_created));
    state.insert("filename".to_string(), json!(iso.filename));
    state.insert("size".to_string(), json!(iso.size));
    state.insert("md5sum".to_string(), json!(iso.md5sum));
    state.insert("sha512sum".to_string(), json!(iso.sha512sum));
    state.insert("status".to_string(), json!(iso.status));
    Value::Object(state)
}

/// Whether an error says the ISO does not exist.
fn is_gone(err: &ProviderError) -> bool {
    match err {
        ProviderError::Api { message, .. } if message.contains("Invalid iso") => true,
        other => other.is_not_found(),
    }
}

/// Download the ISO and wait for it to become available.
///
/// A failed wait yields [`ProviderError::PartialCreate`] carrying the id.
pub async fn create(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    planned: Value,
) -> Result<Value, ProviderError> {
    let request = CreateIsoRequest {
        url: required_str(&planned, "url")?.to_string(),
    };
    info!(url = %request.url, "Creating new ISO");
    let iso = client.create_iso(ctx, &request).await?;
    let id = iso.id.clone();

    let waiter = StateWaiter::new("complete", ["pending"]).with_settings(*wait);
    let iso_id = id.as_str();
    let ready = waiter
        .wait(ctx, move || async move {
            let iso = client.get_iso(ctx, iso_id).await?;
            info!(iso = %iso_id, status = %iso.status, "ISO status");
            let status = iso.status.clone();
            Ok::<_, ProviderError>(Some((iso, status)))
        })
        .await;

    match ready {
        Ok(iso) => Ok(to_state(iso, &planned)),
        Err(err) => Err(ProviderError::PartialCreate {
            id,
            source: Box::new(err),
        }),
    }
}

/// Refresh the ISO; `Value::Null` when it no longer exists.
pub async fn read(ctx: &Context, client: &VultrClient, current: Value) -> Result<Value, ProviderError> {
    let id = state_id(&current)?;
    match client.get_iso(ctx, id).await {
        Ok(iso) => Ok(to_state(iso, &current)),
        Err(err) if is_gone(&err) => {
            warn!(iso = %id, "Removing ISO because it is gone");
            Ok(Value::Null)
        },
        Err(err) => Err(err),
    }
}

/// Extract the address an ISO is attached to from a delete error.
///
/// `Ok(None)` when the error is not an attachment conflict.
fn attached_ip(err: &ProviderError) -> Result<Option<IpAddr>, ProviderError> {
    let ProviderError::Api { message, .. } = err else {
        return Ok(None);
    };
    if !message.contains(ATTACHED_MARKER) {
        return Ok(None);
    }
    message
        .split_whitespace()
        .last()
        .and_then(|word| word.parse::<IpAddr>().ok())
        .map(Some)
        .ok_or_else(|| {
            ProviderError::DependencyConflict(format!(
                "failed to parse IP to which ISO is attached: {message}"
            ))
        })
}

/// Find the instance whose main IP is `ip`, across every page.
async fn instance_with_ip(
    ctx: &Context,
    client: &VultrClient,
    ip: IpAddr,
) -> Result<Instance, ProviderError> {
    let spec = FilterSpec::new([("main_ip", [ip.to_string()])])?;
    let found = run_lookup(ctx, &spec, move |cursor| {
        let options = ListOptions::after(cursor).with_per_page(INSTANCE_PAGE_SIZE);
        async move {
            let (instances, meta) = client.list_instances(ctx, &options).await?;
            Ok::<_, ProviderError>(meta.page(instances))
        }
    })
    .await;

    match found {
        Err(ProviderError::NotFound(_)) => Err(ProviderError::DependencyConflict(format!(
            "ISO is attached to {ip} but no instance has that address"
        ))),
        other => other,
    }
}

/// Detach the mounted ISO from an instance and wait until it is unmounted.
async fn detach_from(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    instance: &Instance,
) -> Result<(), ProviderError> {
    info!(instance = %instance.id, ip = %instance.main_ip, "Detaching ISO");
    client.detach_iso(ctx, &instance.id).await?;

    let instance_id = instance.id.as_str();
    StateWaiter::new("ready", ["isomounted"])
        .with_settings(*wait)
        .wait(ctx, move || async move {
            let status = client.iso_status(ctx, instance_id).await?;
            let state = status.state.clone();
            Ok::<_, ProviderError>(Some((status, state)))
        })
        .await?;
    Ok(())
}

/// Delete the ISO, detaching it from blocking instances first.
///
/// At most [`MAX_DETACH_ATTEMPTS`] attachments are resolved, and an address
/// is never resolved twice; either limit yields
/// [`ProviderError::DependencyConflict`].
pub async fn delete(
    ctx: &Context,
    client: &VultrClient,
    wait: &WaitSettings,
    current: Value,
) -> Result<(), ProviderError> {
    let id = state_id(&current)?;
    let mut resolved: HashSet<IpAddr> = HashSet::new();

    loop {
        info!(iso = %id, "Deleting ISO");
        let err = match client.delete_iso(ctx, id).await {
            Ok(()) => return Ok(()),
            Err(err) if is_gone(&err) => return Ok(()),
            Err(err) => err,
        };

        let Some(ip) = attached_ip(&err)? else {
            return Err(err);
        };
        if resolved.len() >= MAX_DETACH_ATTEMPTS {
            return Err(ProviderError::DependencyConflict(format!(
                "ISO {id} is still attached after detaching it from {} instances",
                resolved.len()
            )));
        }
        if !resolved.insert(ip) {
            return Err(ProviderError::DependencyConflict(format!(
                "ISO {id} is still attached to {ip} after detaching it"
            )));
        }

        let instance = instance_with_ip(ctx, client, ip).await?;
        detach_from(ctx, client, wait, &instance).await?;
    }
}

/// Import an ISO by id.
pub async fn import(ctx: &Context, client: &VultrClient, id: &str) -> Result<Value, ProviderError> {
    let iso = client.get_iso(ctx, id).await?;
    Ok(to_state(iso, &Value::Null))
}
