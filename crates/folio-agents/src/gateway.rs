//! Model gateway
//!
//! The single capability every role depends on: turn a structured request
//! into completion text. Implementations are stateless from the caller's
//! point of view. Deadlines and retries are layered on by
//! [`ResilientGateway`] so each role keeps a single call per stage.

use async_trait::async_trait;
use folio_core::{GatewayConfig, GatewayError, Stage};
use std::sync::Arc;
use std::time::Duration;

/// Structured model request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Stage issuing the request
    pub stage: Stage,
    /// System directive
    pub system: String,
    /// User payload
    pub user: String,
}

impl ModelRequest {
    /// Create new request
    #[inline]
    #[must_use]
    pub fn new(stage: Stage, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            stage,
            system: system.into(),
            user: user.into(),
        }
    }

    /// Single prompt string for text-only backends
    #[must_use]
    pub fn prompt_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Model completion capability
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Complete a request, returning raw completion text
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "model"
    }
}

#[async_trait]
impl<G> ModelGateway for Arc<G>
where
    G: ModelGateway + ?Sized,
{
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<G> ModelGateway for Box<G>
where
    G: ModelGateway + ?Sized,
{
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Deadline and retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Per-attempt deadline
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled afterwards
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Policy from gateway config
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based)
    #[inline]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Gateway wrapper adding a per-attempt deadline and retry with backoff
pub struct ResilientGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: ModelGateway> ResilientGateway<G> {
    /// Wrap a gateway
    #[inline]
    #[must_use]
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Wrapped gateway
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: ModelGateway> ModelGateway for ResilientGateway<G> {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                let delay = self.policy.delay_for(attempt);
                tracing::debug!(stage = %request.stage, attempt, ?delay, "retrying model call");
                tokio::time::sleep(delay).await;
            }

            let error = match tokio::time::timeout(self.policy.timeout, self.inner.complete(request)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) if !e.is_retryable() => return Err(e),
                Ok(Err(e)) => e,
                Err(_) => GatewayError::Timeout {
                    duration_secs: self.policy.timeout.as_secs(),
                },
            };

            tracing::warn!(
                gateway = self.inner.name(),
                stage = %request.stage,
                attempt,
                error = %error,
                "model call failed"
            );
            last_error = Some(error);
        }

        Err(last_error.unwrap_or(GatewayError::EmptyResponse))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
