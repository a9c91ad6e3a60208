//! Source adapters for market briefings
//!
//! Each adapter wraps one external service behind a `briefing-core` trait:
//!
//! | Adapter | Service | Trait |
//! |---|---|---|
//! | [`DartAdapter`] | OpenDART disclosure list | `SourceAdapter` |
//! | [`MarketAdapter`] | Yahoo Finance chart API | `SourceAdapter` |
//! | [`MacroAdapter`] | Bank of Korea ECOS, FRED | `SourceAdapter` |
//! | [`NewsAdapter`] | RSS feeds | `SourceAdapter` |
//! | [`ResearchBoard`] | research report listing | `ReportSource` |
//! | [`PdfToText`] | `pdftotext` binary | `TextExtractor` |
//! | [`LlmNarrator`] | OpenAI / Anthropic | `NarrativeGenerator` |

pub mod crawler;
pub mod dart;
pub mod ecos;
pub mod extractor;
pub mod factory;
pub mod format;
pub mod fred;
pub mod http;
pub mod macro_indicators;
pub mod market;
pub mod narrative;
pub mod news;

pub use crawler::ResearchBoard;
pub use dart::DartAdapter;
pub use ecos::EcosClient;
pub use extractor::PdfToText;
pub use factory::{narrator, research_board, source_adapters, text_extractor};
pub use fred::FredClient;
pub use macro_indicators::MacroAdapter;
pub use market::MarketAdapter;
pub use narrative::LlmNarrator;
pub use news::NewsAdapter;
