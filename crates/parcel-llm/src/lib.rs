//! Parcel LLM Provider Layer
//!
//! Pluggable generation backends implementing the `GenerationBackend` trait
//! from `parcel-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted, deterministic mock for testing
//! - `OpenAiProvider`: OpenAI chat completions API
//! - `AnthropicProvider`: Anthropic messages API
//! - `RateLimitedProvider`: Wraps any provider with a shared call budget
//!
//! Provider selection by model name lives in [`select`].
//!
//! # Examples
//!
//! ```
//! use parcel_llm::MockProvider;
//! use parcel_domain::GenerationBackend;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new(r#"{"value": null, "confidence": 0.0}"#);
//! let result = rt.block_on(provider.generate("test prompt", 0.0, 100)).unwrap();
//! assert!(result.contains("confidence"));
//! ```

#![warn(missing_docs)]

pub mod anthropic;
mod http;
pub mod openai;
pub mod rate_limited;
pub mod select;

use async_trait::async_trait;
use parcel_domain::{GenerationBackend, GenerationError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use rate_limited::RateLimitedProvider;
pub use select::{is_openai_model, provider_for_model, ApiKeys};

/// Errors that can occur while constructing a provider
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key for the provider the model needs
    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    /// Invalid provider configuration
    #[error("Invalid provider configuration: {0}")]
    Config(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

type Reply = Result<String, GenerationError>;

/// Replies for prompts containing a pattern; the last reply repeats
#[derive(Debug)]
struct ScriptedRule {
    pattern: String,
    replies: VecDeque<Reply>,
}

impl ScriptedRule {
    fn next_reply(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<ScriptedRule>,
    sequence: VecDeque<Reply>,
    prompts: Vec<String>,
}

/// Mock generation backend for deterministic testing
///
/// Replies are resolved in this order:
///
/// 1. the first pattern rule whose pattern occurs in the prompt
/// 2. the next entry of the global sequence
/// 3. the default response
///
/// Clones share state, so a clone handed to the extractor still reports its
/// call count to the test.
///
/// # Examples
///
/// ```
/// use parcel_domain::{GenerationBackend, GenerationError};
/// use parcel_llm::MockProvider;
///
/// let provider = MockProvider::new("default")
///     .with_response_for("owner_name", r#"{"value": "John Smith", "confidence": 0.9}"#)
///     .with_sequence(vec![Err(GenerationError::Transient("reset".into()))]);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// assert!(rt.block_on(provider.generate("other", 0.0, 10)).is_err());
/// assert_eq!(rt.block_on(provider.generate("other", 0.0, 10)).unwrap(), "default");
/// assert!(rt.block_on(provider.generate("owner_name prompt", 0.0, 10)).unwrap().contains("John"));
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-model".to_string(),
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue replies consumed in order before the default response
    pub fn with_sequence(self, replies: Vec<Result<String, GenerationError>>) -> Self {
        self.state().sequence.extend(replies);
        self
    }

    /// Always answer `response` for prompts containing `pattern`
    pub fn with_response_for(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.with_sequence_for(pattern, vec![Ok(response.into())])
    }

    /// Always fail with `error` for prompts containing `pattern`
    pub fn with_error_for(self, pattern: impl Into<String>, error: GenerationError) -> Self {
        self.with_sequence_for(pattern, vec![Err(error)])
    }

    /// Answer prompts containing `pattern` with `replies` in order, repeating the last one
    pub fn with_sequence_for(
        self,
        pattern: impl Into<String>,
        replies: Vec<Result<String, GenerationError>>,
    ) -> Self {
        if !replies.is_empty() {
            self.state().rules.push(ScriptedRule {
                pattern: pattern.into(),
                replies: replies.into(),
            });
        }
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Number of calls whose prompt contained `pattern`
    pub fn call_count_for(&self, pattern: &str) -> usize {
        self.state()
            .prompts
            .iter()
            .filter(|p| p.contains(pattern))
            .count()
    }

    /// Every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply(&self, prompt: &str) -> Reply {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        if let Some(rule) = state.rules.iter_mut().find(|r| prompt.contains(&r.pattern)) {
            if let Some(reply) = rule.next_reply() {
                return reply;
            }
        }

        state
            .sequence
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"value": null, "confidence": 0.0, "reasoning": "mock"}"#)
    }
}

#[async_trait]
impl GenerationBackend for MockProvider {
    async fn generate(
        &self,
        prompt: &str,
        _temperature: f64,
        _max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let reply = self.reply(prompt);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
