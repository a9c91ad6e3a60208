//! Anthropic Messages API provider
//!
//! See: https://docs.anthropic.com/en/api/messages

use super::status_error;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

impl AnthropicProvider {
    /// Create a provider with the default 120 second timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, 120)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Anthropic API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_base: ANTHROPIC_API_BASE.to_string(),
        })
    }

    /// Point the provider at a different endpoint (proxies, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let model = request.model.clone();
        let anthropic_request = AnthropicRequest {
            model: request.model,
            messages: request.messages,
            system: request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(status_error(status, error_text, &model));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            anthropic_response.stop_reason.as_deref().unwrap_or("none"),
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens
        );

        Ok(anthropic_response.into_completion(model))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// Wire types matching the Messages API

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<AnthropicContent>,
    stop_reason: Option<String>,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

impl AnthropicResponse {
    fn into_completion(self, requested_model: String) -> CompletionResponse {
        let text = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        CompletionResponse {
            model: self.model.unwrap_or(requested_model),
            text,
            stop_reason: StopReason::from_provider(self.stop_reason.as_deref().unwrap_or("")),
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}
