//! Retry policy for provider calls
//!
//! A failed attempt is inspected through [`AnalysisError::is_retryable`]. Terminal
//! errors return at once; retryable ones are retried after an exponential backoff
//! with random jitter until the attempt budget is spent.

use crate::config::DispatchConfig;
use crate::provider::AnalysisError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and backoff shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Multiplied by `2^n` after failed attempt `n`
    pub backoff_base: Duration,
    /// Exclusive upper bound of the uniform jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// A policy that never waits between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay applied after failed attempt `attempt` (1-indexed)
    ///
    /// With the default one-second base, attempt 1 waits 2-3s and attempt 2
    /// waits 4-5s.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.backoff_base.saturating_mul(factor) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max))
    }
}

/// Runs `op` under `policy`
///
/// Returns the first success, the first terminal error, or the error from the
/// last attempt, unchanged.
///
/// # Arguments
///
/// * `policy` - Attempt budget and backoff
/// * `label` - Names the operation in log lines
/// * `op` - Produces one attempt per call
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::debug!("{} failed with a terminal error: {}", label, e);
                return Err(e);
            }
            Err(e) if attempt >= policy.max_attempts => {
                tracing::debug!("{} gave up after {} attempts", label, attempt);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    label,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
