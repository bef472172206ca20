//! HTTP transport for Vultr REST API calls

use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use url::Url;

use crate::context::Context;
use crate::error::ProviderError;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Base delay between retries; attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Truncate a response body and strip non-printable characters for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error body returned by the Vultr API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Turn a non-success response into [`ProviderError::Api`].
fn api_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| sanitize_for_log(body));
    ProviderError::Api { status, message }
}

/// Authenticated, rate-limited HTTP client for the Vultr API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    api_key: String,
    rate_limit: Duration,
    retry_limit: u32,
    last_request: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("rate_limit", &self.rate_limit)
            .field("retry_limit", &self.retry_limit)
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client rooted at `base_url`
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        rate_limit: Duration,
        retry_limit: u32,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ProviderError::Configuration(format!("invalid base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Configuration(format!(
                "invalid base_url: {base_url}"
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("vultr-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            rate_limit,
            retry_limit,
            last_request: Mutex::new(None),
        })
    }

    /// The configured API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an API path such as `/blocks`
    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ProviderError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ProviderError::Validation(format!("invalid request path {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Wait until the configured interval since the previous request has passed
    async fn throttle(&self, ctx: &Context) -> Result<(), ProviderError> {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.rate_limit {
                ctx.sleep(self.rate_limit - elapsed).await?;
            }
        }
        *last = Some(Instant::now());
        Ok(())
    }

    /// Send a single request and decode the JSON response
    async fn send_once(
        &self,
        ctx: &Context,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        self.throttle(ctx).await?;

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let (status, text) = ctx
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                Ok::<_, ProviderError>((status, text))
            })
            .await?;

        if !status.is_success() {
            error!(
                method = %method,
                status = status.as_u16(),
                body = %sanitize_for_log(&text),
                "API error"
            );
            return Err(api_error(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Make a request, retrying transient failures up to the retry limit
    pub async fn request(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        let url = self.url(path, query)?;
        let mut attempt = 0u32;
        loop {
            debug!(method = %method, path = %path, attempt, "Sending request");
            match self.send_once(ctx, &method, &url, body).await {
                Err(err) if err.is_retryable() && attempt < self.retry_limit => {
                    attempt += 1;
                    warn!(
                        method = %method,
                        path = %path,
                        attempt,
                        error = %err,
                        "Retrying request"
                    );
                    ctx.sleep(RETRY_BACKOFF * attempt).await?;
                },
                result => return result,
            }
        }
    }

    /// Make a GET request
    pub async fn get(
        &self,
        ctx: &Context,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        self.request(ctx, Method::GET, path, query, None).await
    }

    /// Make a POST request
    pub async fn post(
        &self,
        ctx: &Context,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        self.request(ctx, Method::POST, path, &[], body).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, ctx: &Context, path: &str, body: &Value) -> Result<Value, ProviderError> {
        self.request(ctx, Method::PATCH, path, &[], Some(body)).await
    }

    /// Make a PUT request
    pub async fn put(&self, ctx: &Context, path: &str, body: &Value) -> Result<Value, ProviderError> {
        self.request(ctx, Method::PUT, path, &[], Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, ctx: &Context, path: &str) -> Result<Value, ProviderError> {
        self.request(ctx, Method::DELETE, path, &[], None).await
    }
}
