//! Cancellable operation context.
//!
//! Every operation receives a [`Context`]. All network calls and every wait
//! inside a poll go through it, so cancelling the context aborts the
//! operation at its next suspension point with [`ProviderError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;

/// Cancellation scope for a single provider operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    /// Create a fresh, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context driven by an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Derive a context that is cancelled with this one but can also be cancelled alone.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail fast if the context is already cancelled.
    pub fn check(&self) -> Result<(), ProviderError> {
        if self.is_cancelled() {
            Err(ProviderError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Race a fallible future against cancellation.
    pub async fn run<F, T>(&self, future: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ProviderError::Cancelled),
            result = future => result,
        }
    }

    /// Wait for `duration`, returning early with an error if cancelled.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ProviderError> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}
