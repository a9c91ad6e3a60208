//! Chat-completion clients used for briefing narratives and research digests
//!
//! The crate is deliberately text-only: a request is a system prompt plus a
//! short conversation, the response is the assistant's text with token usage.
//!
//! - [`CompletionRequest`] / [`CompletionResponse`]: provider-agnostic payloads
//! - [`LLMProvider`]: the trait each backend implements
//! - [`providers`]: Anthropic and OpenAI-compatible backends (feature-gated)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(any(feature = "anthropic", feature = "openai"))]
pub mod providers;
