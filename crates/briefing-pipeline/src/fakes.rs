//! In-crate fakes of the adapter traits

use async_trait::async_trait;
use briefing_core::{
    FetchWindow, Narrative, NarrativeError, NarrativeGenerator, NarrativeRequest, NewsItem, Record,
    ReportEntry, ReportFile, ReportSource, SourceAdapter, SourceError, SourceKey, TextExtractor,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FakeAdapter {
    key: SourceKey,
    available: bool,
    fail: bool,
    records: Vec<Record>,
    pub calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn ok(key: SourceKey, headlines: &[&str]) -> Self {
        Self {
            key,
            available: true,
            fail: false,
            records: headlines
                .iter()
                .map(|title| {
                    Record::News(NewsItem {
                        title: (*title).to_string(),
                        link: format!("https://example.com/{title}"),
                        summary: String::new(),
                        source: "fake".to_string(),
                        published: None,
                    })
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(key: SourceKey) -> Self {
        Self {
            available: false,
            ..Self::ok(key, &[])
        }
    }

    pub fn failing(key: SourceKey) -> Self {
        Self {
            fail: true,
            ..Self::ok(key, &[])
        }
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn key(&self) -> SourceKey {
        self.key
    }

    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn placeholder(&self) -> String {
        format!("_{} placeholder_", self.key)
    }

    async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<Record>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::fetch("fake", "connection reset"));
        }
        Ok(self.records.clone())
    }

    fn format_for_briefing(&self, records: &[Record], _window: &FetchWindow) -> String {
        records
            .iter()
            .filter_map(|record| match record {
                Record::News(item) => Some(format!("- {}", item.title)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct FakeNarrator {
    available: bool,
    reply: Option<String>,
    pub requests: Mutex<Vec<NarrativeRequest>>,
}

impl FakeNarrator {
    pub fn replying(text: &str) -> Self {
        Self {
            available: true,
            reply: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            available: true,
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::failing()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl NarrativeGenerator for FakeNarrator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn model(&self) -> &'static str {
        "fake-model"
    }

    async fn generate(&self, request: NarrativeRequest) -> Result<Narrative, NarrativeError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Some(text) => Ok(Narrative {
                text: text.clone(),
                model: "fake-model".to_string(),
                tokens_used: Some(1234),
            }),
            None => Err(NarrativeError::Quota("insufficient_quota".to_string())),
        }
    }
}

pub struct FakeBoard {
    entries: Vec<ReportEntry>,
    fail_listing: bool,
    pub downloads: AtomicUsize,
}

impl FakeBoard {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self {
            entries,
            fail_listing: false,
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }
}

pub fn entry(date: &str, title: &str) -> ReportEntry {
    ReportEntry {
        title: title.to_string(),
        date: date.to_string(),
        link: Some(format!("https://example.com/{title}.pdf")),
    }
}

#[async_trait]
impl ReportSource for FakeBoard {
    fn name(&self) -> &'static str {
        "fake board"
    }

    async fn list_reports(&self, _date: NaiveDate) -> Result<Vec<ReportEntry>, SourceError> {
        if self.fail_listing {
            return Err(SourceError::fetch("fake board", "HTTP 503"));
        }
        Ok(self.entries.clone())
    }

    async fn download(&self, entry: &ReportEntry, dir: &Path) -> Result<ReportFile, SourceError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let date: String = entry.date.chars().filter(char::is_ascii_digit).collect();
        let path = dir.join(format!("{date}_{}.pdf", entry.title));
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, b"%PDF-1.4 fake").await?;
        Ok(ReportFile {
            title: entry.title.clone(),
            date: entry.date.clone(),
            path,
        })
    }
}

/// Extractor returning canned pages keyed by file name
pub struct FakeExtractor {
    available: bool,
    pages: HashMap<String, Vec<String>>,
}

impl FakeExtractor {
    pub fn new(pages: &[(&str, &[&str])]) -> Self {
        Self {
            available: true,
            pages: pages
                .iter()
                .map(|(name, pages)| {
                    (
                        (*name).to_string(),
                        pages.iter().map(|p| (*p).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            pages: HashMap::new(),
        }
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake extractor"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.pages
            .get(&name)
            .cloned()
            .ok_or_else(|| SourceError::parse("fake extractor", format!("{name} is corrupt")))
    }
}
