//! Optional LLM narrative spliced into a composed briefing

use crate::document::{DISCLAIMER, Document, NARRATIVE, Section};
use crate::prompts::{ANALYST_SYSTEM_PROMPT, render_briefing_prompt};
use briefing_core::{
    Narrative, NarrativeGenerator, NarrativeRequest, NarrativeSettings, Snapshot, SourceKey,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const NARRATIVE_HEADING: &str = "AI Market Analysis";

/// Adds the narrative section when enabled and requested
///
/// Generation failures leave the document untouched.
pub struct NarrativeInjector {
    generator: Arc<dyn NarrativeGenerator>,
    enabled: bool,
    max_tokens: usize,
    temperature: f32,
}

impl NarrativeInjector {
    pub fn new(generator: Arc<dyn NarrativeGenerator>, settings: &NarrativeSettings) -> Self {
        Self {
            generator,
            enabled: settings.enabled,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[instrument(skip_all, fields(variant = %snapshot.variant().variant, requested = requested))]
    pub async fn inject(
        &self,
        document: Document,
        snapshot: &Snapshot,
        requested: bool,
    ) -> Document {
        if !self.enabled || !requested {
            return document;
        }
        if !self.generator.is_available() {
            warn!("Narrative requested but no generator is configured, skipping");
            return document;
        }

        let settings = snapshot.variant();
        let date = snapshot.run_timestamp().format("%Y-%m-%d").to_string();
        let prompt = match render_briefing_prompt(
            settings.variant,
            &settings.title,
            &date,
            &document.render(),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to render narrative prompt: {}", e);
                return document;
            }
        };

        let request = NarrativeRequest {
            system: ANALYST_SYSTEM_PROMPT.to_string(),
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!("Requesting narrative from {}", self.generator.model());
        match self.generator.generate(request).await {
            Ok(narrative) => {
                info!(
                    "Narrative generated ({} tokens)",
                    narrative
                        .tokens_used
                        .map_or_else(|| "unknown".to_string(), |t| t.to_string())
                );
                let mut document = document;
                document.insert_before(DISCLAIMER, narrative_section(&narrative));
                document
            }
            Err(e) => {
                warn!("Narrative generation failed, publishing without it: {}", e);
                document
            }
        }
    }
}

fn narrative_section(narrative: &Narrative) -> Section {
    let tokens = narrative
        .tokens_used
        .map_or_else(|| "N/A".to_string(), |t| t.to_string());
    Section::new(
        NARRATIVE,
        format!("{}. {NARRATIVE_HEADING}", SourceKey::ALL.len() + 1),
        format!(
            "> Model: `{}` | Tokens: {}\n\n{}",
            narrative.model,
            tokens,
            narrative.text.trim()
        ),
    )
}
