//! Vultr infrastructure provider.
//!
//! Manages Vultr block storage volumes, private ISO images and DNS domains,
//! and exposes filtered lookups over block storage, ISOs, instances,
//! bare-metal servers, reverse IPv4 records and DNS domains.
//!
//! # Overview
//!
//! - **Filter engine**: [`filter`] parses `filter` blocks and matches them
//!   against flattened API records
//! - **Lookups**: [`lookup`] walks every page of a listing and resolves a
//!   filter to exactly one record
//! - **State waits**: [`poll`] polls a remote object until it reaches a
//!   target state, with timeout and cancellation
//! - **Provider**: [`VultrProvider`] implements [`ProviderService`], the
//!   contract a host adapter drives
//!
//! # Quick Start
//!
//! ```no_run
//! use vultr_provider::{Context, ProviderService, VultrProvider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), vultr_provider::ProviderError> {
//! vultr_provider::init_logging();
//!
//! let provider = VultrProvider::new();
//! let ctx = Context::new();
//! provider.configure(&ctx, json!({"api_key": "..."})).await?;
//!
//! let volume = provider
//!     .read_data_source(
//!         &ctx,
//!         "vultr_block_storage",
//!         json!({"filter": [{"name": "label", "values": ["database"]}]}),
//!     )
//!     .await?;
//! println!("{}", volume["id"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod context;
pub mod data_sources;
pub mod error;
pub mod filter;
pub mod logging;
pub mod lookup;
pub mod plan;
pub mod poll;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::VultrClient;
pub use config::ProviderConfig;
pub use context::Context;
pub use error::ProviderError;
pub use filter::{build_filter_spec, FilterSpec, Flatten, FlattenedRecord};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use lookup::{run_lookup, Page};
pub use poll::{StateWaiter, WaitSettings};
pub use provider::VultrProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult};
pub use validation::{is_valid, validate, validate_result};
