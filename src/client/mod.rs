//! Typed Vultr v2 API client.

mod http;
pub mod models;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use http::HttpClient;
use models::*;

use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::ProviderError;

/// Pull `key` out of a response body and decode it.
fn field<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T, ProviderError> {
    match body.get_mut(key).map(Value::take) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(ProviderError::Serialization(
            <serde_json::Error as serde::de::Error>::custom(format!(
                "response is missing '{key}'"
            )),
        )),
    }
}

/// Decode a collection response: records under `key` plus `meta`.
fn listing<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<(Vec<T>, Meta), ProviderError> {
    let meta = match body.get_mut("meta").map(Value::take) {
        Some(Value::Null) | None => Meta::default(),
        Some(meta) => serde_json::from_value(meta)?,
    };
    let items = match body.get_mut(key).map(Value::take) {
        Some(Value::Null) | None => Vec::new(),
        Some(items) => serde_json::from_value(items)?,
    };
    Ok((items, meta))
}

fn to_body<T: Serialize>(request: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(request)?)
}

fn require_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, ProviderError> {
    if id.is_empty() || id.contains('/') {
        return Err(ProviderError::Validation(format!("invalid {kind} id '{id}'")));
    }
    Ok(id)
}

/// Client for the Vultr endpoints the provider manages.
#[derive(Debug)]
pub struct VultrClient {
    http: HttpClient,
}

impl VultrClient {
    /// Wrap an HTTP transport.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Build a client from provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(HttpClient::new(
            &config.base_url,
            config.api_key.clone(),
            config.rate_limit,
            config.retry_limit,
        )?))
    }

    /// The underlying transport.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    // Block storage

    /// List one page of block storage volumes.
    pub async fn list_blocks(
        &self,
        ctx: &Context,
        options: &ListOptions,
    ) -> Result<(Vec<BlockStorage>, Meta), ProviderError> {
        let body = self.http.get(ctx, "/blocks", &options.to_query()).await?;
        listing(body, "blocks")
    }

    /// Get a block storage volume.
    pub async fn get_block(&self, ctx: &Context, id: &str) -> Result<BlockStorage, ProviderError> {
        let id = require_id("block storage", id)?;
        let body = self.http.get(ctx, &format!("/blocks/{id}"), &[]).await?;
        field(body, "block")
    }

    /// Create a block storage volume.
    pub async fn create_block(
        &self,
        ctx: &Context,
        request: &CreateBlockRequest,
    ) -> Result<BlockStorage, ProviderError> {
        let body = self.http.post(ctx, "/blocks", Some(&to_body(request)?)).await?;
        field(body, "block")
    }

    /// Change the label or size of a block storage volume.
    pub async fn update_block(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdateBlockRequest,
    ) -> Result<(), ProviderError> {
        let id = require_id("block storage", id)?;
        self.http
            .patch(ctx, &format!("/blocks/{id}"), &to_body(request)?)
            .await?;
        Ok(())
    }

    /// Attach a block storage volume to an instance.
    pub async fn attach_block(
        &self,
        ctx: &Context,
        id: &str,
        request: &AttachBlockRequest,
    ) -> Result<(), ProviderError> {
        let id = require_id("block storage", id)?;
        self.http
            .post(ctx, &format!("/blocks/{id}/attach"), Some(&to_body(request)?))
            .await?;
        Ok(())
    }

    /// Detach a block storage volume from its instance.
    pub async fn detach_block(
        &self,
        ctx: &Context,
        id: &str,
        request: &DetachBlockRequest,
    ) -> Result<(), ProviderError> {
        let id = require_id("block storage", id)?;
        self.http
            .post(ctx, &format!("/blocks/{id}/detach"), Some(&to_body(request)?))
            .await?;
        Ok(())
    }

    /// Delete a block storage volume.
    pub async fn delete_block(&self, ctx: &Context, id: &str) -> Result<(), ProviderError> {
        let id = require_id("block storage", id)?;
        self.http.delete(ctx, &format!("/blocks/{id}")).await?;
        Ok(())
    }

    // Private ISOs

    /// List one page of private ISOs.
    pub async fn list_isos(
        &self,
        ctx: &Context,
        options: &ListOptions,
    ) -> Result<(Vec<Iso>, Meta), ProviderError> {
        let body = self.http.get(ctx, "/iso", &options.to_query()).await?;
        listing(body, "isos")
    }

    /// Get a private ISO.
    pub async fn get_iso(&self, ctx: &Context, id: &str) -> Result<Iso, ProviderError> {
        let id = require_id("ISO", id)?;
        let body = self.http.get(ctx, &format!("/iso/{id}"), &[]).await?;
        field(body, "iso")
    }

    /// Start an ISO download from a URL.
    pub async fn create_iso(&self, ctx: &Context, request: &CreateIsoRequest) -> Result<Iso, ProviderError> {
        let body = self.http.post(ctx, "/iso", Some(&to_body(request)?)).await?;
        field(body, "iso")
    }

    /// Delete a private ISO.
    pub async fn delete_iso(&self, ctx: &Context, id: &str) -> Result<(), ProviderError> {
        let id = require_id("ISO", id)?;
        self.http.delete(ctx, &format!("/iso/{id}")).await?;
        Ok(())
    }

    // Instances

    /// List one page of instances.
    pub async fn list_instances(
        &self,
        ctx: &Context,
        options: &ListOptions,
    ) -> Result<(Vec<Instance>, Meta), ProviderError> {
        let body = self.http.get(ctx, "/instances", &options.to_query()).await?;
        listing(body, "instances")
    }

    /// Get an instance.
    pub async fn get_instance(&self, ctx: &Context, id: &str) -> Result<Instance, ProviderError> {
        let id = require_id("instance", id)?;
        let body = self.http.get(ctx, &format!("/instances/{id}"), &[]).await?;
        field(body, "instance")
    }

    /// Detach whatever ISO is mounted on an instance.
    pub async fn detach_iso(&self, ctx: &Context, instance_id: &str) -> Result<(), ProviderError> {
        let id = require_id("instance", instance_id)?;
        self.http
            .post(ctx, &format!("/instances/{id}/iso/detach"), None)
            .await?;
        Ok(())
    }

    /// ISO mount state of an instance.
    pub async fn iso_status(&self, ctx: &Context, instance_id: &str) -> Result<IsoStatus, ProviderError> {
        let id = require_id("instance", instance_id)?;
        let body = self.http.get(ctx, &format!("/instances/{id}/iso"), &[]).await?;
        field(body, "iso_status")
    }

    /// Backup schedule of an instance.
    pub async fn get_backup_schedule(
        &self,
        ctx: &Context,
        instance_id: &str,
    ) -> Result<BackupSchedule, ProviderError> {
        let id = require_id("instance", instance_id)?;
        let body = self
            .http
            .get(ctx, &format!("/instances/{id}/backup-schedule"), &[])
            .await?;
        field(body, "backup_schedule")
    }

    /// One page of the private networks an instance is attached to.
    pub async fn list_instance_private_networks(
        &self,
        ctx: &Context,
        instance_id: &str,
        options: &ListOptions,
    ) -> Result<(Vec<PrivateNetworkAttachment>, Meta), ProviderError> {
        let id = require_id("instance", instance_id)?;
        let body = self
            .http
            .get(ctx, &format!("/instances/{id}/private-networks"), &options.to_query())
            .await?;
        listing(body, "private_networks")
    }

    /// One page of the IPv4 addresses of an instance.
    pub async fn list_ipv4(
        &self,
        ctx: &Context,
        instance_id: &str,
        options: &ListOptions,
    ) -> Result<(Vec<Ipv4>, Meta), ProviderError> {
        let id = require_id("instance", instance_id)?;
        let body = self
            .http
            .get(ctx, &format!("/instances/{id}/ipv4"), &options.to_query())
            .await?;
        listing(body, "ipv4s")
    }

    // Bare metal

    /// List one page of bare-metal servers.
    pub async fn list_bare_metals(
        &self,
        ctx: &Context,
        options: &ListOptions,
    ) -> Result<(Vec<BareMetalServer>, Meta), ProviderError> {
        let body = self.http.get(ctx, "/bare-metals", &options.to_query()).await?;
        listing(body, "bare_metals")
    }

    // DNS

    /// Get a DNS domain.
    pub async fn get_domain(&self, ctx: &Context, domain: &str) -> Result<Domain, ProviderError> {
        let domain = require_id("domain", domain)?;
        let body = self.http.get(ctx, &format!("/domains/{domain}"), &[]).await?;
        field(body, "domain")
    }

    /// Create a DNS domain.
    pub async fn create_domain(
        &self,
        ctx: &Context,
        request: &CreateDomainRequest,
    ) -> Result<Domain, ProviderError> {
        let body = self.http.post(ctx, "/domains", Some(&to_body(request)?)).await?;
        field(body, "domain")
    }

    /// Change the DNSSEC setting of a domain.
    pub async fn update_domain(
        &self,
        ctx: &Context,
        domain: &str,
        request: &UpdateDomainRequest,
    ) -> Result<(), ProviderError> {
        let domain = require_id("domain", domain)?;
        self.http
            .put(ctx, &format!("/domains/{domain}"), &to_body(request)?)
            .await?;
        Ok(())
    }

    /// Delete a DNS domain.
    pub async fn delete_domain(&self, ctx: &Context, domain: &str) -> Result<(), ProviderError> {
        let domain = require_id("domain", domain)?;
        self.http.delete(ctx, &format!("/domains/{domain}")).await?;
        Ok(())
    }
}
