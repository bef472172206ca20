//! Provider configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::poll::WaitSettings;
use crate::schema::{Attribute, Schema};

/// Default Vultr API root.
pub const DEFAULT_BASE_URL: &str = "https://api.vultr.com/v2";

/// Environment variable consulted when `api_key` is not configured.
pub const API_KEY_ENV: &str = "VULTR_API_KEY";

/// Interval between API calls when `rate_limit` is not set.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

/// Retries of a failed API call when `retry_limit` is not set.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Schema of the provider configuration block.
pub fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_description("Vultr provider configuration")
        .with_attribute(
            "api_key",
            Attribute::optional_string()
                .sensitive()
                .with_description(format!(
                    "The API Key that allows interaction with the API (defaults to ${API_KEY_ENV})"
                )),
        )
        .with_attribute(
            "rate_limit",
            Attribute::optional_int64().with_description(
                "Allows users to set the speed of API calls to work with the Vultr Rate Limit",
            ),
        )
        .with_attribute(
            "retry_limit",
            Attribute::optional_int64().with_description(
                "Allows users to set the maximum number of retries allowed for a failed API call.",
            ),
        )
        .with_attribute(
            "base_url",
            Attribute::optional_string().with_description("Override the Vultr API endpoint"),
        )
}

/// Raw configuration as received from the host.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    api_key: Option<String>,
    rate_limit: Option<u64>,
    retry_limit: Option<u32>,
    base_url: Option<String>,
}

/// Validated provider configuration.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Minimum interval between API calls.
    pub rate_limit: Duration,
    /// Retries of a call that failed with a transient error.
    pub retry_limit: u32,
    /// API root.
    pub base_url: String,
    /// Timing of waits for remote state changes.
    pub wait: WaitSettings,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("rate_limit", &self.rate_limit)
            .field("retry_limit", &self.retry_limit)
            .field("base_url", &self.base_url)
            .field("wait", &self.wait)
            .finish()
    }
}

impl ProviderConfig {
    /// A configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            rate_limit: DEFAULT_RATE_LIMIT,
            retry_limit: DEFAULT_RETRY_LIMIT,
            base_url: DEFAULT_BASE_URL.to_string(),
            wait: WaitSettings::default(),
        }
    }

    /// Parse the host configuration, falling back to `VULTR_API_KEY`.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(value, |name| std::env::var(name).ok())
    }

    /// Parse the host configuration with an explicit environment lookup.
    pub fn from_value_with_env<E>(value: &Value, env: E) -> Result<Self, ProviderError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match value {
            Value::Null => RawConfig::default(),
            other => serde_json::from_value(other.clone()).map_err(|e| {
                ProviderError::Configuration(format!("invalid provider configuration: {e}"))
            })?,
        };

        let api_key = raw
            .api_key
            .filter(|key| !key.is_empty())
            .or_else(|| env(API_KEY_ENV).filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "api_key must be configured or set through {API_KEY_ENV}"
                ))
            })?;

        Ok(Self {
            api_key,
            rate_limit: raw
                .rate_limit
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RATE_LIMIT),
            retry_limit: raw.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT),
            base_url: raw
                .base_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            wait: WaitSettings::default(),
        })
    }

    /// Override the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the interval between API calls.
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Override the retry budget.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Override the wait timings.
    pub fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }
}
