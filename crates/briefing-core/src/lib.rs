//! Core abstractions for the market briefing pipeline
//!
//! This crate defines the types every other briefing crate agrees on:
//!
//! - [`Snapshot`] and [`SectionResult`]: the immutable output of one aggregation pass
//! - [`ReportVariant`] and [`VariantSettings`]: the pre-open / intraday / post-close
//!   report configurations
//! - Adapter traits ([`SourceAdapter`], [`NarrativeGenerator`], [`ReportSource`],
//!   [`TextExtractor`]) that external services are wrapped behind
//! - The error taxonomy and [`BriefingConfig`]

pub mod adapter;
pub mod config;
pub mod error;
pub mod model;
pub mod variant;

pub use adapter::{
    Narrative, NarrativeGenerator, NarrativeRequest, ReportSource, SourceAdapter, TextExtractor,
};
pub use config::{
    BriefingConfig, BriefingConfigBuilder, Credentials, FeedSource, FredSeries, NarrativeProvider,
    NarrativeSettings, ResearchSettings, ScheduleSpec, ScheduledJob, StatCode, VariantOverride,
    WatchItem,
};
pub use error::{BriefingError, NarrativeError, Result, SourceError};
pub use model::{
    Disclosure, FetchWindow, IndexLevel, IndicatorReading, NOT_CONFIGURED_PLACEHOLDER,
    NO_DATA_TEXT, NewsItem, PriceBar, Record, ReportEntry, ReportFile, ReportId, SectionResult,
    Snapshot, SourceKey, UNAVAILABLE_PLACEHOLDER,
};
pub use variant::{Lookback, ReportVariant, SectionHeaders, SectionLimits, VariantSettings};
