//! Bounded retry for generation calls
//!
//! At most `max_attempts` calls, first attempt included. The delay before
//! attempt `n` is zero for the first attempt and `base * 2^(n-2)` afterwards,
//! capped at `max_delay`; with the defaults that is 0s, 1s, 2s.

use crate::config::PipelineConfig;
use parcel_domain::GenerationError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry schedule for generation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

/// Result of a retried operation and the number of calls it took
#[derive(Debug)]
pub struct Attempted<T> {
    /// Final result
    pub result: Result<T, GenerationError>,

    /// Calls made, including the first
    pub attempts: u32,
}

impl<T> Attempted<T> {
    /// True if the last error was retryable, so the budget ran out
    pub fn exhausted(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_retryable())
    }
}

impl RetryPolicy {
    /// Create a policy; a budget of zero still makes one call
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Policy described by the pipeline settings
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.retry_base_delay(),
            config.retry_max_delay(),
        )
    }

    /// Most calls the policy will make
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt number `attempt` (1-based)
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 2).min(31);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails fatally, or the budget ends
    ///
    /// The closure receives the 1-based attempt number. A rate-limit hint
    /// from the backend lengthens the scheduled delay, up to `max_delay`.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation(attempt).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };
            if !error.is_retryable() || attempt >= self.max_attempts() {
                return Attempted {
                    result: Err(error),
                    attempts: attempt,
                };
            }

            let mut delay = self.delay_before_attempt(attempt + 1);
            if let GenerationError::RateLimited {
                retry_after: Some(hint),
            } = &error
            {
                delay = delay.max((*hint).min(self.max_delay));
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                "Generation failed, retrying: {}",
                error
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
