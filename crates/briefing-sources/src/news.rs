//! Headline collection from RSS feeds of Korean financial newspapers

use crate::http;
use async_trait::async_trait;
use briefing_core::config::FeedSource;
use briefing_core::{FetchWindow, NewsItem, Record, SourceAdapter, SourceError, SourceKey};
use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const ADAPTER: &str = "RSS";
const SUMMARY_MAX_CHARS: usize = 200;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern"));

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
}

/// Strip markup and collapse whitespace
fn clean_html(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    SPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn truncate_summary(text: &str) -> String {
    if text.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Parse a feed timestamp into local time
fn parse_pub_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()
}

/// Parse one RSS document into news items attributed to `source`
fn parse_feed(body: &str, source: &str) -> Result<Vec<NewsItem>, SourceError> {
    let document: RssDocument = quick_xml::de::from_str(body)
        .map_err(|e| SourceError::parse(ADAPTER, format!("{source}: {e}")))?;

    Ok(document
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let title = clean_html(&item.title);
            if title.is_empty() {
                return None;
            }
            Some(NewsItem {
                title,
                link: item.link.trim().to_string(),
                summary: truncate_summary(&clean_html(&item.description)),
                source: source.to_string(),
                published: item.pub_date.as_deref().and_then(parse_pub_date),
            })
        })
        .collect())
}

fn matches_keywords(item: &NewsItem, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", item.title, item.summary).to_lowercase();
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

/// Keep matching items inside the window, one per link, newest first
///
/// Items without a publication time are kept and sorted last.
fn select_items(items: Vec<NewsItem>, keywords: &[String], cutoff: NaiveDateTime) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut selected: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| item.published.is_none_or(|published| published >= cutoff))
        .filter(|item| matches_keywords(item, keywords))
        .filter(|item| seen.insert(item.link.clone()))
        .collect();

    selected.sort_by(|a, b| match (a.published, b.published) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    selected
}

/// News section adapter over a fixed set of RSS feeds
pub struct NewsAdapter {
    client: Client,
    feeds: Vec<FeedSource>,
    keywords: Vec<String>,
}

impl NewsAdapter {
    pub fn new(feeds: Vec<FeedSource>, keywords: Vec<String>, timeout: Duration) -> Self {
        Self {
            client: http::client(timeout),
            feeds,
            keywords,
        }
    }

    async fn fetch_feed(&self, feed: &FeedSource) -> Result<Vec<NewsItem>, SourceError> {
        let response = self
            .client
            .get(&feed.url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, format!("{}: {e}", feed.name)))?;

        if !response.status().is_success() {
            return Err(SourceError::fetch(
                ADAPTER,
                format!("{}: HTTP {}", feed.name, response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, format!("{}: {e}", feed.name)))?;

        parse_feed(&body, &feed.name)
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    fn key(&self) -> SourceKey {
        SourceKey::News
    }

    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn is_available(&self) -> bool {
        !self.feeds.is_empty()
    }

    fn status_detail(&self) -> String {
        if self.feeds.is_empty() {
            "no feeds configured".to_string()
        } else {
            format!(
                "{} feeds, {} keywords (no key required)",
                self.feeds.len(),
                self.keywords.len()
            )
        }
    }

    fn placeholder(&self) -> String {
        "_Headlines could not be retrieved from the configured feeds._".to_string()
    }

    #[instrument(skip(self, window), fields(adapter = ADAPTER, feeds = self.feeds.len()))]
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Record>, SourceError> {
        let mut items = Vec::new();
        let mut failures = 0;

        for feed in &self.feeds {
            match self.fetch_feed(feed).await {
                Ok(feed_items) => {
                    debug!("{} returned {} items", feed.name, feed_items.len());
                    items.extend(feed_items);
                }
                Err(e) => {
                    failures += 1;
                    warn!("Failed to get headlines from {}: {}", feed.name, e);
                }
            }
        }

        if !self.feeds.is_empty() && failures == self.feeds.len() {
            return Err(SourceError::fetch(ADAPTER, "every feed request failed"));
        }

        Ok(select_items(items, &self.keywords, window.news_cutoff())
            .into_iter()
            .map(Record::News)
            .collect())
    }

    fn format_for_briefing(&self, records: &[Record], window: &FetchWindow) -> String {
        let items: Vec<&NewsItem> = records
            .iter()
            .filter_map(|record| match record {
                Record::News(item) => Some(item),
                _ => None,
            })
            .collect();

        if items.is_empty() {
            return format!(
                "No matching headlines in the last {} hours.",
                window.news_max_hours
            );
        }

        let mut lines: Vec<String> = items
            .iter()
            .take(window.max_news)
            .map(|item| {
                if item.link.is_empty() {
                    format!("- {} - {}", item.title, item.source)
                } else {
                    format!("- [{}]({}) - {}", item.title, item.link, item.source)
                }
            })
            .collect();

        if items.len() > window.max_news {
            lines.push(format!("\n... and {} more", items.len() - window.max_news));
        }

        lines.join("\n")
    }
}
