//! Retrying transport
//!
//! Wraps one logical node request with bounded retries. The transport never
//! looks at payloads: callers hand it a closure producing the request future
//! and it decides, from the error alone, whether to try again.

pub mod errors;
pub mod retry;

pub use errors::{ConnectionErrorKind, TransportError, RETRYABLE_STATUS_CODES};
pub use retry::{retry_with_backoff, RetryConfig, RetryStats};

use crate::metrics::SdkMetrics;
use std::future::Future;
use std::sync::Arc;

#[derive(Clone)]
pub struct RetryingTransport {
    config: RetryConfig,
    metrics: Option<Arc<SdkMetrics>>,
}

impl RetryingTransport {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SdkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `action` under the retry policy, classifying failures with
    /// [`TransportError::is_retryable`].
    pub async fn execute<A, Fut, T>(&self, operation: &str, action: A) -> Result<T, TransportError>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let (result, stats) =
            retry_with_backoff(operation, &self.config, TransportError::is_retryable, action).await;

        if let Some(metrics) = &self.metrics {
            metrics
                .transport_retries
                .inc_by(u64::from(stats.attempts.saturating_sub(1)));
            metrics
                .node_latency
                .observe(stats.total_duration.as_secs_f64());
        }

        result
    }
}

impl Default for RetryingTransport {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl std::fmt::Debug for RetryingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTransport")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
