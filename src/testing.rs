//! Test harness for `ProviderService` implementations.
//!
//! [`ProviderTester`] calls a provider the way a host would, with every call
//! running under one [`Context`], and strings the calls together into whole
//! lifecycles. The free functions assert on plans and diagnostics.
//!
//! # Example
//!
//! ```ignore
//! use vultr_provider::testing::{assert_plan_no_changes, ProviderTester};
//! use vultr_provider::VultrProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_domain_converges() {
//!     let tester = ProviderTester::new(VultrProvider::new());
//!     tester
//!         .configure(json!({"api_key": "test", "base_url": server.uri()}))
//!         .await
//!         .unwrap();
//!
//!     let config = json!({"domain": "example.com"});
//!     let state = tester.lifecycle_create("vultr_dns_domain", config.clone()).await.unwrap();
//!     let plan = tester.plan_update("vultr_dns_domain", state, config).await.unwrap();
//!     assert_plan_no_changes(&plan);
//! }
//! ```

use std::fmt;

use serde_json::Value;

use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::Diagnostic;
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Drives a provider under a single context.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
    ctx: Context,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider` with a fresh context.
    pub fn new(provider: P) -> Self {
        Self::with_context(provider, Context::new())
    }

    /// Wrap `provider`; every call runs under `ctx`.
    pub fn with_context(provider: P, ctx: Context) -> Self {
        Self { provider, ctx }
    }

    /// Configure the provider, failing on any error diagnostic.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(&self.ctx, config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration, failing on any error diagnostic.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a data source configuration, failing on any error diagnostic.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource that does not exist yet.
    pub async fn plan_create(&self, resource_type: &str, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan `config` against an existing state.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Create a resource from a planned state.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(&self.ctx, resource_type, planned_state).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, state: Value) -> Result<Value, ProviderError> {
        self.provider.read(&self.ctx, resource_type, state).await
    }

    /// Apply an in-place update.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(&self.ctx, resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(&self.ctx, resource_type, state).await
    }

    /// Import a resource by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(&self.ctx, resource_type, id).await
    }

    /// Resolve a data source.
    pub async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(&self.ctx, data_source_type, config)
            .await
    }

    /// Plan, create, then refresh; returns the refreshed state.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan an in-place change, apply it, then refresh.
    ///
    /// Fails with a validation error when the plan would replace the resource.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.requires_replace {
            return Err(ProviderError::Validation(format!(
                "update of {resource_type} requires replacement: {:?}",
                plan.changed_paths()
            )));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    /// Create with `initial`, update to `updated`, check the result converges,
    /// then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial: Value,
        updated: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial).await?;
        let state = self
            .lifecycle_update(resource_type, created, updated.clone())
            .await?;

        let replan = self.plan_update(resource_type, state.clone(), updated).await?;
        if !replan.changes.is_empty() {
            return Err(ProviderError::Validation(format!(
                "{resource_type} did not converge: {:?}",
                replan.changed_paths()
            )));
        }

        self.delete(resource_type, state.clone()).await?;
        Ok(state)
    }
}

/// Why a harness call failed.
#[derive(Debug)]
pub enum TestError {
    /// The provider answered with error diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    Provider(ProviderError),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Provider(err) => write!(f, "provider error: {err}"),
            TestError::Diagnostics(diagnostics) => {
                write!(f, "{} error diagnostic(s)", diagnostics.len())?;
                for diagnostic in diagnostics {
                    write!(f, "\n  {}", diagnostic.summary)?;
                    if let Some(attribute) = &diagnostic.attribute {
                        write!(f, " (at {attribute})")?;
                    }
                    if let Some(detail) = &diagnostic.detail {
                        write!(f, ": {detail}")?;
                    }
                }
                Ok(())
            },
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(err: ProviderError) -> Self {
        TestError::Provider(err)
    }
}

/// Keep only error diagnostics; warnings pass.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<Diagnostic> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a plan changes nothing.
///
/// # Panics
///
/// Panics listing the changed attributes otherwise.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, got {:?}",
        plan.changes
    );
}

/// Assert that a plan changes `path`.
///
/// # Panics
///
/// Panics listing the changed attributes otherwise.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected a change to '{}', changed: {:?}",
        path,
        plan.changed_paths()
    );
}

/// Assert that a plan replaces the resource.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected replacement, changed: {:?}",
        plan.changed_paths()
    );
}

/// Assert that a plan updates the resource in place.
///
/// # Panics
///
/// Panics if the plan replaces the resource.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected an in-place update, changed: {:?}",
        plan.changed_paths()
    );
}

/// Assert that some error diagnostic's summary contains `needle`.
///
/// # Panics
///
/// Panics listing the error summaries otherwise.
pub fn assert_error_contains(diagnostics: &[Diagnostic], needle: &str) {
    let errors: Vec<&str> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.summary.as_str())
        .collect();
    assert!(
        errors.iter().any(|summary| summary.contains(needle)),
        "Expected an error containing '{}', got {:?}",
        needle,
        errors
    );
}
