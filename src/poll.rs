//! Poll a remote object until it reaches a target state.
//!
//! A [`StateWaiter`] repeatedly calls a refresh function that reports the
//! object's current state. It succeeds once the target state is observed,
//! keeps polling while the state is one of the pending states, and fails on
//! any other state, on timeout, or when the context is cancelled.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::error::ProviderError;

/// Timing knobs shared by every wait the provider performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Overall deadline, counted from the start of the wait.
    pub timeout: Duration,
    /// Delay before the first refresh.
    pub delay: Duration,
    /// Interval between refreshes.
    pub min_interval: Duration,
    /// Consecutive not-found or transient refresh failures tolerated.
    pub not_found_checks: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60 * 60),
            delay: Duration::from_secs(10),
            min_interval: Duration::from_secs(3),
            not_found_checks: 60,
        }
    }
}

/// What a refresh observed: the payload and its state string.
pub type Observation<T> = Option<(T, String)>;

/// A configured wait for one state transition.
#[derive(Debug, Clone)]
pub struct StateWaiter {
    target: String,
    pending: Vec<String>,
    settings: WaitSettings,
}

impl StateWaiter {
    /// Wait for `target`, tolerating any of `pending` on the way.
    pub fn new<I, S>(target: impl Into<String>, pending: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            pending: pending.into_iter().map(Into::into).collect(),
            settings: WaitSettings::default(),
        }
    }

    /// Override the timing settings.
    pub fn with_settings(mut self, settings: WaitSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The state this waiter is waiting for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Drive the wait to completion.
    ///
    /// `refresh` returns `Ok(Some((payload, state)))` when the object was
    /// read, `Ok(None)` when it is not visible yet, or an error.
    pub async fn wait<T, F, Fut>(&self, ctx: &Context, mut refresh: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation<T>, ProviderError>>,
    {
        let deadline = Instant::now() + self.settings.timeout;
        let mut last_observed = String::new();
        let mut misses = 0u32;

        info!(
            target_state = %self.target,
            pending = ?self.pending,
            timeout = ?self.settings.timeout,
            "Waiting for state"
        );

        self.pause(ctx, self.settings.delay, deadline).await?;

        loop {
            if Instant::now() >= deadline {
                return Err(self.timeout(last_observed));
            }

            let refreshed = match tokio::time::timeout_at(deadline, ctx.run(refresh())).await {
                Ok(refreshed) => refreshed,
                Err(_) => return Err(self.timeout(last_observed)),
            };

            match refreshed {
                Ok(Some((payload, state))) => {
                    misses = 0;
                    debug!(state = %state, target_state = %self.target, "Observed state");
                    if state == self.target {
                        info!(target_state = %self.target, "Reached target state");
                        return Ok(payload);
                    }
                    if !self.pending.iter().any(|p| *p == state) {
                        warn!(state = %state, target_state = %self.target, "Unexpected state");
                        return Err(ProviderError::UnexpectedState {
                            observed: state,
                            target: self.target.clone(),
                        });
                    }
                    last_observed = state;
                },
                Ok(None) => {
                    misses += 1;
                    debug!(misses, "Object not visible yet");
                    if misses > self.settings.not_found_checks {
                        return Err(ProviderError::NotFound(format!(
                            "object still missing after {} checks while waiting for '{}'",
                            self.settings.not_found_checks, self.target
                        )));
                    }
                },
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
                Err(err) if err.is_retryable() || err.is_not_found() => {
                    misses += 1;
                    debug!(misses, error = %err, "Transient refresh failure");
                    if misses > self.settings.not_found_checks {
                        return Err(ProviderError::fetch("refreshing state", err));
                    }
                },
                Err(err) => return Err(ProviderError::fetch("refreshing state", err)),
            }

            self.pause(ctx, self.settings.min_interval, deadline).await?;
        }
    }

    /// Sleep for `duration`, but never past `deadline`.
    async fn pause(
        &self,
        ctx: &Context,
        duration: Duration,
        deadline: Instant,
    ) -> Result<(), ProviderError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        ctx.sleep(duration.min(remaining)).await
    }

    fn timeout(&self, last_observed: String) -> ProviderError {
        ProviderError::Timeout {
            target: self.target.clone(),
            last_observed,
        }
    }
}
