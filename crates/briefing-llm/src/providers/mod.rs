//! Concrete provider implementations

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::LLMError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(status: StatusCode, body: String, model: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "quota".into(), "m").is_quota());
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LLMError::ModelNotFound(m) if m == "gpt-x"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".into(), "m"),
            LLMError::RequestFailed(_)
        ));
    }
}
