//! Retry with exponential backoff for optimistic concurrency conflicts.
//!
//! A conflict means another writer appended between our read and our append.
//! The fix is always the same: re-run the whole command against fresh state.
//! Other errors, including `StreamUnavailable`, are returned immediately.

use std::future::Future;
use std::time::Duration;

use progression_core::error::DomainError;
use tokio::time::sleep;

/// Retry policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `initial_delay`: 10ms
/// - `max_delay`: 1 second
/// - `multiplier`: 2 (delay doubles each retry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of re-runs after the first attempt.
    pub max_retries: u32,
    /// Delay before the first re-run.
    pub initial_delay: Duration,
    /// Cap for the exponential backoff.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default delay cap and multiplier.
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before re-run number `attempt` (0-based):
    /// `initial_delay * multiplier ^ attempt`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs `operation`, re-running it while it fails with
/// `DomainError::ConcurrencyConflict` and retries remain.
///
/// # Errors
///
/// Returns the first non-conflict error, or the last conflict once the
/// policy is exhausted.
pub async fn retry_on_conflict<F, Fut, T>(
    policy: &RetryPolicy,
    command_type: &str,
    mut operation: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(command_type, attempt, "command succeeded after retry");
                }
                return Ok(value);
            }
            Err(err @ DomainError::ConcurrencyConflict { .. }) if attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    command_type,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "concurrency conflict, retrying command"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
