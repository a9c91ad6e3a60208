//! Build the configured adapters

use crate::{
    DartAdapter, LlmNarrator, MacroAdapter, MarketAdapter, NewsAdapter, PdfToText, ResearchBoard,
};
use briefing_core::{BriefingConfig, SourceAdapter};

/// Section adapters in composition order
pub fn source_adapters(config: &BriefingConfig) -> Vec<Box<dyn SourceAdapter>> {
    let timeout = config.request_timeout();
    let credentials = &config.credentials;

    vec![
        Box::new(MarketAdapter::new(
            config.indices.clone(),
            config.watchlist.clone(),
        )),
        Box::new(MacroAdapter::new(
            credentials.ecos_api_key.clone(),
            config.stat_codes.clone(),
            credentials.fred_api_key.clone(),
            config.fred_series.clone(),
            timeout,
        )),
        Box::new(DartAdapter::new(
            credentials.dart_api_key.clone(),
            &config.watchlist,
            timeout,
        )),
        Box::new(NewsAdapter::new(
            config.feeds.clone(),
            config.news_keywords.clone(),
            timeout,
        )),
    ]
}

/// Narrator for briefing narratives
pub fn narrator(config: &BriefingConfig) -> LlmNarrator {
    LlmNarrator::from_settings(&config.narrative, config.narrative_api_key())
}

/// Narrator for the research digest, with the research overrides applied
pub fn research_narrator(config: &BriefingConfig) -> LlmNarrator {
    let settings = config.research_narrative_settings();
    LlmNarrator::from_settings(&settings, config.api_key_for(settings.provider))
}

pub fn research_board(config: &BriefingConfig) -> ResearchBoard {
    ResearchBoard::new(config.research.listing_url.clone(), config.request_timeout())
}

pub fn text_extractor() -> PdfToText {
    PdfToText::new()
}
