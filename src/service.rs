//! The host-facing provider contract.
//!
//! A host adapter drives a provider only through [`ProviderService`]. Each
//! method that may reach the network takes a [`Context`]; cancelling it
//! aborts the call with [`ProviderError::Cancelled`]. States cross the
//! boundary as JSON objects shaped by the schema the provider serves.

use serde_json::Value;

use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// Operations a host can invoke on a provider.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Schemas for the provider configuration, resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Parse and apply provider configuration.
    ///
    /// Invalid configuration is reported as error diagnostics and leaves
    /// the provider unconfigured.
    async fn configure(&self, ctx: &Context, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Check a resource configuration against its schema.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))?;
        Ok(validate(resource, &config))
    }

    /// Check a data source configuration against its schema.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let data_source = schema
            .data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))?;
        Ok(validate(data_source, &config))
    }

    /// Diff `proposed_state` against `prior_state`; no network access.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the object described by `planned_state` and return its state.
    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh a resource; `Value::Null` when the remote object is gone.
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Apply an in-place change and return the new state.
    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource; deleting one that is already gone succeeds.
    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError>;

    /// Bring an existing object under management by its id.
    async fn import_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError>;

    /// Resolve a data source configuration to its state.
    async fn read_data_source(
        &self,
        ctx: &Context,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError>;
}
