//! OpenAI chat-completions provider
//!
//! Also works with OpenAI-compatible servers (vLLM, llama.cpp, LM Studio,
//! Azure deployments) through [`OpenAIConfig::with_api_base`].
//!
//! ```no_run
//! use briefing_llm::{CompletionRequest, LLMProvider, Message};
//! use briefing_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("sk-...").with_timeout(60);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .system("You are a Korean equity market analyst.")
//!     .add_message(Message::user("Summarize today's session."))
//!     .max_tokens(500)
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

use super::status_error;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,

    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(
        skip(self, request),
        fields(model = %request.model, api_base = %self.config.api_base)
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenAI API at {}", self.config.api_base);

        let model = request.model.clone();
        let openai_request = OpenAIRequest {
            model: request.model,
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(status_error(status, error_text, &model));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        openai_response.into_completion(model)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI-specific wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    /// Some compatible servers omit usage
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// System prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);

    if let Some(sys) = system {
        result.push(OpenAIMessage {
            role: "system",
            content: sys,
        });
    }

    result.extend(messages.into_iter().map(|msg| OpenAIMessage {
        role: match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        },
        content: msg.content,
    }));

    result
}

impl OpenAIResponse {
    fn into_completion(self, requested_model: String) -> Result<CompletionResponse> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LLMError::UnexpectedResponse("No choices in response".to_string())
        })?;

        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            "Received response - finish_reason: {}, tokens: {}/{}",
            choice.finish_reason.as_deref().unwrap_or("none"),
            usage.input_tokens,
            usage.output_tokens
        );

        Ok(CompletionResponse {
            model: self.model.unwrap_or(requested_model),
            text: choice.message.content.unwrap_or_default(),
            stop_reason: StopReason::from_provider(choice.finish_reason.as_deref().unwrap_or("")),
            usage,
        })
    }
}
