//! Error types for completion calls

use thiserror::Error;

/// Result type for completion calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while talking to a provider
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Missing key or bad endpoint settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether the provider refused the call because of quota or rate limits
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_))
    }
}
