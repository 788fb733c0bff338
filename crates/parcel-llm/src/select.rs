//! Provider selection by model name

use crate::{AnthropicProvider, LlmError, OpenAiProvider};
use parcel_domain::GenerationBackend;
use std::sync::Arc;

/// Environment variable holding the OpenAI key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the Anthropic key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const OPENAI_MODEL_PREFIXES: &[&str] = &["gpt-3.5", "gpt-4", "o1", "o3", "o4"];

/// API keys available to the provider factory
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// OpenAI key
    pub openai: Option<String>,
    /// Anthropic key
    pub anthropic: Option<String>,
}

impl ApiKeys {
    /// Read keys from the process environment; blank values count as absent
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        };
        Self {
            openai: read(OPENAI_API_KEY_ENV),
            anthropic: read(ANTHROPIC_API_KEY_ENV),
        }
    }
}

/// Whether a model name is served by OpenAI
pub fn is_openai_model(model: &str) -> bool {
    let model = model.trim().to_ascii_lowercase();
    OPENAI_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Build the generation backend for a model name
///
/// OpenAI model families go to [`OpenAiProvider`]; every other name is sent
/// to [`AnthropicProvider`].
pub fn provider_for_model(
    model: &str,
    keys: &ApiKeys,
) -> Result<Arc<dyn GenerationBackend>, LlmError> {
    if model.trim().is_empty() {
        return Err(LlmError::Config("model name is empty".to_string()));
    }

    if is_openai_model(model) {
        let key = keys
            .openai
            .clone()
            .ok_or_else(|| LlmError::MissingApiKey("OpenAI".to_string()))?;
        tracing::debug!(model, "Selected OpenAI provider");
        Ok(Arc::new(OpenAiProvider::new(key, model)?))
    } else {
        let key = keys
            .anthropic
            .clone()
            .ok_or_else(|| LlmError::MissingApiKey("Anthropic".to_string()))?;
        tracing::debug!(model, "Selected Anthropic provider");
        Ok(Arc::new(AnthropicProvider::new(key, model)?))
    }
}
