//! The Vultr provider: schema registry and operation dispatch.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::VultrClient;
use crate::config::{provider_config_schema, ProviderConfig};
use crate::context::Context;
use crate::data_sources;
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::poll::WaitSettings;
use crate::resources::{block_storage, dns_domain, iso_private};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// State established by `configure`.
#[derive(Debug)]
struct Configured {
    client: VultrClient,
    wait: WaitSettings,
}

/// Provider for Vultr block storage, private ISOs and DNS domains.
#[derive(Debug, Default)]
pub struct VultrProvider {
    configured: RwLock<Option<Arc<Configured>>>,
    wait_override: Option<WaitSettings>,
}

impl VultrProvider {
    /// An unconfigured provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `wait` for every state wait instead of the configured timings.
    pub fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait_override = Some(wait);
        self
    }

    async fn configured(&self) -> Result<Arc<Configured>, ProviderError> {
        self.configured.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

fn unknown_resource(resource_type: &str) -> ProviderError {
    ProviderError::UnknownResource(resource_type.to_string())
}

#[async_trait::async_trait]
impl ProviderService for VultrProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(provider_config_schema())
            .with_resource(block_storage::TYPE_NAME, block_storage::schema())
            .with_resource(dns_domain::TYPE_NAME, dns_domain::schema())
            .with_resource(iso_private::TYPE_NAME, iso_private::schema())
            .with_data_source(
                data_sources::block_storage::TYPE_NAME,
                data_sources::block_storage::schema(),
            )
            .with_data_source(
                data_sources::iso_private::TYPE_NAME,
                data_sources::iso_private::schema(),
            )
            .with_data_source(
                data_sources::instance::TYPE_NAME,
                data_sources::instance::schema(),
            )
            .with_data_source(
                data_sources::bare_metal_server::TYPE_NAME,
                data_sources::bare_metal_server::schema(),
            )
            .with_data_source(
                data_sources::reverse_ipv4::TYPE_NAME,
                data_sources::reverse_ipv4::schema(),
            )
            .with_data_source(
                data_sources::dns_domain::TYPE_NAME,
                data_sources::dns_domain::schema(),
            )
    }

    #[instrument(skip(self, ctx, config), name = "provider.configure")]
    async fn configure(&self, ctx: &Context, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("Configure called");
        ctx.check()?;

        let diagnostics = validate(&provider_config_schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
            return Ok(diagnostics);
        }

        let mut settings = ProviderConfig::from_value(&config)?;
        if let Some(wait) = self.wait_override {
            settings = settings.with_wait_settings(wait);
        }
        let client = VultrClient::from_config(&settings).map_err(|e| {
            error!(error = %e, "Configure failed");
            e
        })?;

        *self.configured.write().await = Some(Arc::new(Configured {
            client,
            wait: settings.wait,
        }));
        info!(base_url = %settings.base_url, "Configure completed successfully");
        Ok(diagnostics)
    }

    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| unknown_resource(resource_type))?;
        let mut diagnostics = validate(resource, &config);
        if resource_type == dns_domain::TYPE_NAME {
            diagnostics.extend(dns_domain::validate_config(&config));
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, prior_state, proposed_state, _config), name = "provider.plan")]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| unknown_resource(resource_type))?;
        let plan = plan_resource(resource, prior_state.as_ref(), proposed_state)?;
        debug!(
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "Plan completed"
        );
        Ok(plan)
    }

    #[instrument(skip(self, ctx, planned_state), name = "provider.create")]
    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let configured = self.configured().await?;
        let (client, wait) = (&configured.client, &configured.wait);
        let result = match resource_type {
            block_storage::TYPE_NAME => block_storage::create(ctx, client, wait, planned_state).await,
            dns_domain::TYPE_NAME => dns_domain::create(ctx, client, planned_state).await,
            iso_private::TYPE_NAME => iso_private::create(ctx, client, wait, planned_state).await,
            other => Err(unknown_resource(other)),
        };
        match &result {
            Ok(_) => info!("Create completed successfully"),
            Err(e) => error!(error = %e, partial_id = e.partial_id(), "Create failed"),
        }
        result
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.read")]
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let configured = self.configured().await?;
        let client = &configured.client;
        let result = match resource_type {
            block_storage::TYPE_NAME => block_storage::read(ctx, client, current_state).await,
            dns_domain::TYPE_NAME => dns_domain::read(ctx, client, current_state).await,
            iso_private::TYPE_NAME => iso_private::read(ctx, client, current_state).await,
            other => Err(unknown_resource(other)),
        };
        if let Err(e) = &result {
            error!(error = %e, "Read failed");
        }
        result
    }

    #[instrument(skip(self, ctx, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let configured = self.configured().await?;
        let (client, wait) = (&configured.client, &configured.wait);
        let result = match resource_type {
            block_storage::TYPE_NAME => {
                block_storage::update(ctx, client, wait, prior_state, planned_state).await
            },
            dns_domain::TYPE_NAME => dns_domain::update(ctx, client, prior_state, planned_state).await,
            iso_private::TYPE_NAME => Err(ProviderError::Validation(
                "vultr_iso_private has no updatable attributes".to_string(),
            )),
            other => Err(unknown_resource(other)),
        };
        match &result {
            Ok(_) => info!("Update completed successfully"),
            Err(e) => error!(error = %e, "Update failed"),
        }
        result
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.delete")]
    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let configured = self.configured().await?;
        let (client, wait) = (&configured.client, &configured.wait);
        let result = match resource_type {
            block_storage::TYPE_NAME => block_storage::delete(ctx, client, wait, current_state).await,
            dns_domain::TYPE_NAME => dns_domain::delete(ctx, client, current_state).await,
            iso_private::TYPE_NAME => iso_private::delete(ctx, client, wait, current_state).await,
            other => Err(unknown_resource(other)),
        };
        match &result {
            Ok(()) => info!("Delete completed successfully"),
            Err(e) => error!(error = %e, "Delete failed"),
        }
        result
    }

    #[instrument(skip(self, ctx), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let configured = self.configured().await?;
        let client = &configured.client;
        let state = match resource_type {
            block_storage::TYPE_NAME => block_storage::import(ctx, client, id).await?,
            dns_domain::TYPE_NAME => dns_domain::import(ctx, client, id).await?,
            iso_private::TYPE_NAME => iso_private::import(ctx, client, id).await?,
            other => return Err(unknown_resource(other)),
        };
        info!("Import completed successfully");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, ctx, config), name = "provider.read_data_source")]
    async fn read_data_source(
        &self,
        ctx: &Context,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let configured = self.configured().await?;
        let client = &configured.client;
        let result = match data_source_type {
            data_sources::block_storage::TYPE_NAME => {
                data_sources::block_storage::read(ctx, client, config).await
            },
            data_sources::iso_private::TYPE_NAME => {
                data_sources::iso_private::read(ctx, client, config).await
            },
            data_sources::instance::TYPE_NAME => data_sources::instance::read(ctx, client, config).await,
            data_sources::bare_metal_server::TYPE_NAME => {
                data_sources::bare_metal_server::read(ctx, client, config).await
            },
            data_sources::reverse_ipv4::TYPE_NAME => {
                data_sources::reverse_ipv4::read(ctx, client, config).await
            },
            data_sources::dns_domain::TYPE_NAME => {
                data_sources::dns_domain::read(ctx, client, config).await
            },
            other => Err(unknown_resource(other)),
        };
        match &result {
            Ok(_) => info!("ReadDataSource completed successfully"),
            Err(e) => error!(error = %e, "ReadDataSource failed"),
        }
        result
    }
}
