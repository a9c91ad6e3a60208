//! Narrative generation over a chat-completion provider

use async_trait::async_trait;
use briefing_core::config::{NarrativeProvider, NarrativeSettings};
use briefing_core::{Narrative, NarrativeError, NarrativeGenerator, NarrativeRequest};
use briefing_llm::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use briefing_llm::{CompletionRequest, LLMError, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// [`NarrativeGenerator`] backed by an [`LLMProvider`]
///
/// A narrator without a provider is valid and reports itself unavailable.
#[derive(Clone)]
pub struct LlmNarrator {
    provider: Option<Arc<dyn LLMProvider>>,
    model: String,
}

impl LlmNarrator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
        }
    }

    /// Narrator that never generates
    pub fn disabled(model: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: model.into(),
        }
    }

    /// Build from settings; a missing key or a client error yields a disabled narrator
    pub fn from_settings(settings: &NarrativeSettings, api_key: Option<&str>) -> Self {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            debug!("No API key for {}, narratives disabled", settings.provider);
            return Self::disabled(&settings.model);
        };

        let provider: Result<Arc<dyn LLMProvider>, LLMError> = match settings.provider {
            NarrativeProvider::OpenAi => {
                let mut config = OpenAIConfig::new(api_key).with_timeout(settings.timeout_secs);
                if let Some(base) = &settings.api_base {
                    config = config.with_api_base(base);
                }
                OpenAIProvider::with_config(config).map(|p| Arc::new(p) as Arc<dyn LLMProvider>)
            }
            NarrativeProvider::Anthropic => {
                AnthropicProvider::with_timeout(api_key, settings.timeout_secs).map(|p| {
                    let p = match &settings.api_base {
                        Some(base) => p.with_api_base(base),
                        None => p,
                    };
                    Arc::new(p) as Arc<dyn LLMProvider>
                })
            }
        };

        match provider {
            Ok(provider) => Self::new(provider, &settings.model),
            Err(e) => {
                warn!("Failed to create {} client: {}", settings.provider, e);
                Self::disabled(&settings.model)
            }
        }
    }
}

fn map_error(error: LLMError) -> NarrativeError {
    match error {
        LLMError::ConfigurationError(msg) => NarrativeError::MissingCredential(msg),
        LLMError::AuthenticationFailed => NarrativeError::MissingCredential(error.to_string()),
        e if e.is_quota() => NarrativeError::Quota(e.to_string()),
        e => NarrativeError::Request(e.to_string()),
    }
}

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn generate(&self, request: NarrativeRequest) -> Result<Narrative, NarrativeError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            NarrativeError::MissingCredential("no narrative provider configured".to_string())
        })?;

        let completion = CompletionRequest::builder(&self.model)
            .system(request.system)
            .add_message(Message::user(request.prompt))
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build();

        let response = provider.complete(completion).await.map_err(map_error)?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }

        let total = response.usage.total();
        debug!("{} answered with {} tokens", provider.name(), total);

        Ok(Narrative {
            text: text.to_string(),
            model: response.model,
            tokens_used: (total > 0).then_some(total),
        })
    }
}
