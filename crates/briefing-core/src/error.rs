//! Error types for briefing operations
//!
//! Errors are split by where they are allowed to surface:
//! - [`SourceError`] never leaves the aggregator or a pipeline stage; it is
//!   absorbed into an "unavailable" placeholder or a smaller result set.
//! - [`NarrativeError`] is absorbed by the narrative injector, but is fatal
//!   for the research summarization stage.
//! - [`BriefingError`] is what a run reports to its caller.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a data-source adapter
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing credential or missing external tool
    #[error("{adapter} is unavailable: {reason}")]
    Unavailable { adapter: String, reason: String },

    /// Network or HTTP failure
    #[error("{adapter} request failed: {reason}")]
    Fetch { adapter: String, reason: String },

    /// The service answered with something we could not interpret
    #[error("{adapter} returned malformed data: {reason}")]
    Parse { adapter: String, reason: String },

    /// Local filesystem failure (downloads, extraction output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn unavailable(adapter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            adapter: adapter.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(adapter: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            adapter: adapter.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(adapter: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            adapter: adapter.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the narrative-generation adapter
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// No API key configured for the selected provider
    #[error("narrative credentials are not configured: {0}")]
    MissingCredential(String),

    /// Network, HTTP or provider failure
    #[error("narrative request failed: {0}")]
    Request(String),

    /// Rate limit or quota exhausted
    #[error("narrative quota exceeded: {0}")]
    Quota(String),

    /// Provider answered without any text
    #[error("narrative response contained no text")]
    EmptyResponse,
}

/// Errors surfaced to the caller of a briefing or research run
#[derive(Debug, Error)]
pub enum BriefingError {
    /// Summarization found nothing to summarize
    #[error("no extracted report texts found for {date}")]
    NoReportTexts { date: NaiveDate },

    /// Summarization needs a generator and none is usable
    #[error("narrative generation is unavailable: {0}")]
    NarrativeUnavailable(String),

    /// The single summarization call failed
    #[error(transparent)]
    Narrative(#[from] NarrativeError),

    /// The output document could not be written
    #[error("failed to publish {}: {source}", .path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download ledger could not be read or written
    #[error("download ledger {}: {reason}", .path.display())]
    Ledger { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for briefing operations
pub type Result<T> = std::result::Result<T, BriefingError>;
