//! Bounded retry with exponential backoff
//!
//! The first retry is immediate; later retries wait
//! `min(base * 2^(attempt-1), cap)`. After `max_attempts` the last error is
//! returned untouched. Non-retryable errors are returned on first failure.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Upper bound for any single backoff, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 { 5 }
fn default_base_backoff_ms() -> u64 { 1_000 }
fn default_max_backoff_ms() -> u64 { 10_000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-indexed)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u64.saturating_pow(attempt - 1);
        let delay_ms = self
            .base_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }

    /// Delays between consecutive attempts; `max_attempts - 1` entries
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(move |attempt| self.backoff_after(attempt))
    }
}

/// What a retried call cost
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub attempts: u32,
    /// Backoff delays actually taken, in order
    pub delays: Vec<Duration>,
    pub total_duration: Duration,
}

/// Retry `action` while `is_retryable` approves the error and attempts remain.
///
/// `is_retryable` is the caller's classification hook; this function knows
/// nothing about the payload.
pub async fn retry_with_backoff<A, Fut, T, E, C>(
    operation: &str,
    config: &RetryConfig,
    is_retryable: C,
    mut action: A,
) -> (Result<T, E>, RetryStats)
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let attempts = AtomicU32::new(0);
    let delays = Mutex::new(Vec::new());
    let max_attempts = config.max_attempts.max(1);

    let schedule = config
        .backoff_schedule()
        .inspect(|delay| delays.lock().push(*delay));

    let result = RetryIf::spawn(
        schedule,
        || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt > 1 {
                debug!(operation, attempt, max_attempts, "Retrying operation");
            }
            action()
        },
        |err: &E| {
            let retry = is_retryable(err);
            if !retry {
                warn!(operation, error = %err, "Permanent error, not retrying");
            } else {
                debug!(
                    operation,
                    attempt = attempts.load(Ordering::Relaxed),
                    error = %err,
                    "Transient error"
                );
            }
            retry
        },
    )
    .await;

    let stats = RetryStats {
        attempts: attempts.load(Ordering::Relaxed),
        delays: delays.into_inner(),
        total_duration: started.elapsed(),
    };

    match &result {
        Ok(_) if stats.attempts > 1 => debug!(
            operation,
            attempts = stats.attempts,
            duration_ms = stats.total_duration.as_millis() as u64,
            "Operation succeeded after retry"
        ),
        Err(err) if stats.attempts >= max_attempts && is_retryable(err) => warn!(
            operation,
            attempts = stats.attempts,
            error = %err,
            "All retry attempts exhausted"
        ),
        _ => {}
    }

    (result, stats)
}
