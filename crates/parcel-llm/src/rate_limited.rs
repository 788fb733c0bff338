//! Rate-limited generation backend wrapper
//!
//! Wraps any provider with a call budget using the governor crate. Calls over
//! budget wait for a permit instead of failing.

use crate::LlmError;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use parcel_domain::{GenerationBackend, GenerationError};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A provider wrapper that enforces a shared request budget
///
/// Clones share the same limiter, so every concurrent feature extraction
/// draws from one budget.
#[derive(Clone)]
pub struct RateLimitedProvider<G> {
    inner: G,
    limiter: Arc<DirectRateLimiter>,
}

impl<G: GenerationBackend> RateLimitedProvider<G> {
    /// Allow `requests_per_minute` calls per minute
    pub fn per_minute(inner: G, requests_per_minute: u32) -> Result<Self, LlmError> {
        let rate = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| LlmError::Config("requests_per_minute must be > 0".to_string()))?;
        Ok(Self::with_quota(inner, Quota::per_minute(rate)))
    }

    /// Allow `requests_per_second` calls per second with a burst allowance
    pub fn with_burst(inner: G, requests_per_second: u32, burst: u32) -> Result<Self, LlmError> {
        let rate = NonZeroU32::new(requests_per_second)
            .ok_or_else(|| LlmError::Config("requests_per_second must be > 0".to_string()))?;
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| LlmError::Config("burst must be > 0".to_string()))?;
        Ok(Self::with_quota(inner, Quota::per_second(rate).allow_burst(burst)))
    }

    /// Create with a custom quota
    pub fn with_quota(inner: G, quota: Quota) -> Self {
        Self {
            inner,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: GenerationBackend> GenerationBackend for RateLimitedProvider<G> {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        self.limiter.until_ready().await;
        self.inner.generate(prompt, temperature, max_tokens).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_rate_rejected() {
        assert!(RateLimitedProvider::per_minute(MockProvider::default(), 0).is_err());
        assert!(RateLimitedProvider::with_burst(MockProvider::default(), 1, 0).is_err());
    }

    #[tokio::test]
    async fn test_passes_through_within_budget() {
        let mock = MockProvider::new("ok").with_model("gpt-4");
        let provider = RateLimitedProvider::per_minute(mock.clone(), 600).unwrap();

        assert_eq!(provider.generate("p", 0.0, 10).await.unwrap(), "ok");
        assert_eq!(provider.model_name(), "gpt-4");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_queues_calls_over_budget() {
        let mock = MockProvider::new("ok");
        // 20 per second, burst 1: the third call waits roughly 100ms in total
        let provider = RateLimitedProvider::with_burst(mock.clone(), 20, 1).unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            assert!(provider.generate("p", 0.0, 10).await.is_ok());
        }

        assert_eq!(mock.call_count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
