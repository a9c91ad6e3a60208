//! Adapter traits for external services
//!
//! Each external data or generation service is wrapped behind one of these
//! traits. A missing credential is a normal runtime state reported through
//! `is_available()`, not an error.

use crate::error::{NarrativeError, SourceError};
use crate::model::{FetchWindow, Record, ReportEntry, ReportFile, SourceKey};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A data source feeding one briefing section
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Section this adapter fills
    fn key(&self) -> SourceKey;

    /// Human-readable adapter name used in logs and status output
    fn name(&self) -> &str;

    /// Whether credentials and configuration allow a fetch
    fn is_available(&self) -> bool;

    /// Why the adapter is or is not usable, without touching the network
    fn status_detail(&self) -> String {
        if self.is_available() {
            "ready".to_string()
        } else {
            "not configured".to_string()
        }
    }

    /// Text shown in place of the section when this source yields nothing usable
    fn placeholder(&self) -> String {
        format!("_{} data is unavailable for this run._", self.name())
    }

    /// Fetch records bounded by the window
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Record>, SourceError>;

    /// Render fetched records as the section body
    fn format_for_briefing(&self, records: &[Record], window: &FetchWindow) -> String;
}

/// Input for one narrative generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Generated narrative text with usage metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<usize>,
}

/// LLM-backed prose generation
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    fn is_available(&self) -> bool;

    fn model(&self) -> &str;

    async fn generate(&self, request: NarrativeRequest) -> Result<Narrative, NarrativeError>;
}

/// Board of downloadable research reports
#[async_trait]
pub trait ReportSource: Send + Sync {
    fn name(&self) -> &str;

    /// List entries the board shows around `date`; callers filter by exact date
    async fn list_reports(&self, date: NaiveDate) -> Result<Vec<ReportEntry>, SourceError>;

    /// Download one entry into `dir`
    async fn download(&self, entry: &ReportEntry, dir: &Path) -> Result<ReportFile, SourceError>;
}

/// PDF to text conversion
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the underlying tool can be used on this machine
    async fn is_available(&self) -> bool;

    /// Text of each page, in page order; empty pages are returned as empty strings
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, SourceError>;
}
