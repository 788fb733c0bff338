//! OpenAI Provider Implementation
//!
//! Calls the chat completions endpoint with a JSON-only system message.
//! A single attempt per call; retries belong to the extractor's retry policy.

use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::LlmError;
use async_trait::async_trait;
use parcel_domain::{FatalKind, GenerationBackend, GenerationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str =
    "You are a precise property data extraction assistant. Always respond with valid JSON.";

/// OpenAI chat completions client
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against the public endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    /// Create a provider against a custom endpoint (proxies, compatible servers)
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("OpenAI".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, temperature: f64, max_tokens: u32) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens,
        }
    }
}

/// Pull the first choice's text out of a chat completions response body
fn parse_response(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::fatal(
            FatalKind::InvalidResponse,
            format!("Failed to parse response: {}", e),
        )
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            GenerationError::fatal(FatalKind::InvalidResponse, "Response contained no choices")
        })
}

#[async_trait]
impl GenerationBackend for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, temperature, max_tokens));

        let body = http::send(request).await?;
        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
