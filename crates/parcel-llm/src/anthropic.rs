//! Anthropic Provider Implementation
//!
//! Calls the messages endpoint. A single attempt per call; retries belong to
//! the extractor's retry policy.

use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::LlmError;
use async_trait::async_trait;
use parcel_domain::{FatalKind, GenerationBackend, GenerationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic messages client
pub struct AnthropicProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
    /// Create a provider against the public endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    /// Create a provider against a custom endpoint
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("Anthropic".to_string()));
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

    fn request_body<'a>(&'a self, prompt: &'a str, temperature: f64, max_tokens: u32) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// Concatenate the text blocks of a messages response body
fn parse_response(body: &str) -> Result<String, GenerationError> {
    let response: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::fatal(
            FatalKind::InvalidResponse,
            format!("Failed to parse response: {}", e),
        )
    })?;

    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(GenerationError::fatal(
            FatalKind::InvalidResponse,
            "Response contained no text blocks",
        ));
    }
    Ok(text.join(""))
}

#[async_trait]
impl GenerationBackend for AnthropicProvider {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(prompt, temperature, max_tokens));

        let body = http::send(request).await?;
        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
