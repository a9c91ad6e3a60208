//! Research report board crawler
//!
//! The board is a server-rendered table: one `<tr>` per report with a
//! `YYYY.MM.DD` date cell and an anchor whose `href` is either a direct PDF
//! link or a `javascript:` call carrying the PDF path.

use crate::http::{self, SharedRateLimiter};
use async_trait::async_trait;
use briefing_core::{ReportEntry, ReportFile, ReportSource, SourceError};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const ADAPTER: &str = "Research board";
const PDF_MAGIC: &[u8] = b"%PDF";
const MAX_FILE_STEM_CHARS: usize = 80;
const TITLE_HASH_CHARS: usize = 8;

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("row pattern"));
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}\.\d{2}\.\d{2}").expect("date pattern"));
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]*href\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</a>"#)
        .expect("anchor pattern")
});
static JS_PDF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)['"]([^'"]+\.pdf)['"]"#).expect("pdf pattern"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\s]+"#).expect("file name pattern"));

/// Resolve an anchor `href` to an absolute download URL
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == "#" {
        return None;
    }

    let target = if href.to_ascii_lowercase().starts_with("javascript:") {
        JS_PDF_RE.captures(href)?.get(1)?.as_str()
    } else {
        href
    };

    base.join(target).ok().map(String::from)
}

fn clean_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ").replace("&amp;", "&").replace("&nbsp;", " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse listing HTML into entries, in page order
fn parse_listing(html: &str, base: &Url) -> Vec<ReportEntry> {
    ROW_RE
        .captures_iter(html)
        .filter_map(|row| {
            let cells = row.get(1)?.as_str();
            let date = DATE_RE.find(cells)?.as_str().to_string();
            let anchor = ANCHOR_RE.captures(cells)?;
            let title = clean_text(anchor.get(3)?.as_str());
            if title.is_empty() {
                return None;
            }
            let href = anchor.get(1).or_else(|| anchor.get(2))?.as_str();
            Some(ReportEntry {
                title,
                date,
                link: resolve_link(base, href),
            })
        })
        .collect()
}

/// `{YYYYMMDD}_{title}_{hash}.pdf`
///
/// The title is sanitized and truncated, so the hash of the untouched title
/// keeps distinct reports of the same day in distinct files.
fn file_name(entry: &ReportEntry) -> String {
    let date: String = entry.date.chars().filter(char::is_ascii_digit).collect();
    let stem = UNSAFE_FILE_CHARS.replace_all(entry.title.trim(), "_");
    let stem: String = stem.trim_matches('_').chars().take(MAX_FILE_STEM_CHARS).collect();
    let hash = blake3::hash(entry.title.as_bytes()).to_hex();
    format!("{date}_{stem}_{}.pdf", &hash.as_str()[..TITLE_HASH_CHARS])
}

/// [`ReportSource`] over a research board listing page
pub struct ResearchBoard {
    client: Client,
    listing_url: String,
    rate_limiter: SharedRateLimiter,
}

impl ResearchBoard {
    pub fn new(listing_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http::session_client(timeout),
            listing_url: listing_url.into(),
            rate_limiter: http::rate_limiter(30),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::fetch(
                ADAPTER,
                format!("HTTP {} for {url}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ReportSource for ResearchBoard {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    #[instrument(skip(self), fields(adapter = ADAPTER))]
    async fn list_reports(&self, date: NaiveDate) -> Result<Vec<ReportEntry>, SourceError> {
        let base = Url::parse(&self.listing_url)
            .map_err(|e| SourceError::parse(ADAPTER, format!("listing URL: {e}")))?;

        let body = self.get_bytes(&self.listing_url).await?;
        let html = String::from_utf8_lossy(&body);
        let entries = parse_listing(&html, &base);

        debug!(
            "Listing has {} entries ({} dated {})",
            entries.len(),
            entries
                .iter()
                .filter(|e| e.date == date.format("%Y.%m.%d").to_string())
                .count(),
            date
        );
        Ok(entries)
    }

    #[instrument(skip(self, entry, dir), fields(adapter = ADAPTER, title = %entry.title))]
    async fn download(&self, entry: &ReportEntry, dir: &Path) -> Result<ReportFile, SourceError> {
        let link = entry.link.as_deref().ok_or_else(|| {
            SourceError::fetch(ADAPTER, format!("no download link for {}", entry.title))
        })?;

        let bytes = self.get_bytes(link).await?;
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(SourceError::parse(
                ADAPTER,
                format!("{link} did not return a PDF"),
            ));
        }

        tokio::fs::create_dir_all(dir).await?;
        let name = file_name(entry);
        let path = dir.join(&name);
        let partial = dir.join(format!(".{name}.part"));
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(ReportFile {
            title: entry.title.clone(),
            date: entry.date.clone(),
            path,
        })
    }
}
