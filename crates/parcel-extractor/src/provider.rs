//! Generation backend wiring from configuration

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use parcel_domain::GenerationBackend;
use parcel_llm::{provider_for_model, ApiKeys, RateLimitedProvider};
use std::sync::Arc;

/// Build the configured model's backend behind the configured call budget
pub fn generation_backend(
    config: &ExtractorConfig,
    keys: &ApiKeys,
) -> Result<Arc<dyn GenerationBackend>, ExtractorError> {
    let provider = provider_for_model(&config.rag.model, keys)
        .map_err(|e| ExtractorError::Config(e.to_string()))?;
    let limited = RateLimitedProvider::per_minute(provider, config.pipeline.rate_limit_per_minute)
        .map_err(|e| ExtractorError::Config(e.to_string()))?;
    Ok(Arc::new(limited))
}
