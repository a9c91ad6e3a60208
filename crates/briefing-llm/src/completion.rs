//! Completion request and response types

use crate::Message;
use serde::{Deserialize, Serialize};

/// Request for a completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (provider-specific)
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response from a completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Model that actually served the request
    pub model: String,

    /// Generated text; empty when the provider returned no text content
    pub text: String,

    pub stop_reason: StopReason,

    pub usage: TokenUsage,
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural completion (end of turn)
    EndTurn,

    /// Hit max tokens limit
    MaxTokens,

    StopSequence,

    /// Provider refused or filtered the output
    ContentFilter,
}

impl StopReason {
    pub(crate) fn from_provider(reason: &str) -> Self {
        match reason {
            "max_tokens" | "length" => Self::MaxTokens,
            "stop_sequence" => Self::StopSequence,
            "content_filter" | "refusal" => Self::ContentFilter,
            _ => Self::EndTurn,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

impl CompletionRequest {
    /// Create a builder for completion requests
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }
}

/// Builder for CompletionRequest
pub struct CompletionRequestBuilder {
    model: String,
    messages: Vec<Message>,
    system: Option<String>,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl CompletionRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Add a single message
    pub fn add_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the completion request
    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            messages: self.messages,
            system: self.system,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = CompletionRequest::builder("gpt-4o-mini")
            .add_message(Message::user("Summarize the session"))
            .system("You are a Korean equity market analyst")
            .max_tokens(2000)
            .temperature(0.3)
            .build();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn test_token_usage() {
        let usage = TokenUsage {
            input_tokens: 1200,
            output_tokens: 350,
        };
        assert_eq!(usage.total(), 1550);
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(StopReason::from_provider("length"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_provider("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_provider("stop"), StopReason::EndTurn);
    }
}
