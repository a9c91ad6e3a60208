//! Data model shared by adapters, the aggregator and the composer

use crate::variant::VariantSettings;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Placeholder used when a source failed or reported itself unavailable
pub const UNAVAILABLE_PLACEHOLDER: &str = "_Data unavailable for this run._";

/// Placeholder used when no adapter is registered for a section
pub const NOT_CONFIGURED_PLACEHOLDER: &str = "_No data source is configured for this section._";

/// Body used when a source answered but had nothing to report
pub const NO_DATA_TEXT: &str = "_No new items in this window._";

/// Briefing section identity, in composition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKey {
    /// Index levels and watch-list prices
    Market,
    /// Macro indicators (rates, FX)
    Macro,
    /// Corporate disclosures
    Disclosures,
    /// Financial news headlines
    News,
}

impl SourceKey {
    pub const ALL: [SourceKey; 4] = [Self::Market, Self::Macro, Self::Disclosures, Self::News];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Macro => "macro",
            Self::Disclosures => "disclosures",
            Self::News => "news",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" | "krx" | "prices" => Ok(Self::Market),
            "macro" | "ecos" | "indicators" => Ok(Self::Macro),
            "disclosures" | "dart" => Ok(Self::Disclosures),
            "news" => Ok(Self::News),
            other => Err(format!(
                "unknown source '{other}' (expected market, macro, disclosures or news)"
            )),
        }
    }
}

/// Corporate filing from the disclosure system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub corp_name: String,
    pub stock_code: String,
    pub report_name: String,
    pub receipt_no: String,
    /// Receipt date as the service reports it (`YYYYMMDD`)
    pub receipt_date: String,
    pub filer: String,
}

impl Disclosure {
    /// Receipt date as `YYYY-MM-DD`, or the raw value if it is not eight digits
    pub fn display_date(&self) -> String {
        let raw = &self.receipt_date;
        if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
            format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
        } else {
            raw.clone()
        }
    }
}

/// One OHLCV row for a watch-list instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub name: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Change versus the previous close, in percent
    pub change_pct: Option<f64>,
}

/// Closing level of a market index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexLevel {
    pub name: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Latest reading of a macro statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub name: String,
    /// Publishing source, e.g. "ECOS" or "FRED"
    pub source: String,
    /// Period label as published (`20240102`, `2024-01-02`, `202401`)
    pub period: String,
    pub value: f64,
    pub change: Option<f64>,
    pub unit: String,
}

/// Headline from a news feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Feed name
    pub source: String,
    pub published: Option<NaiveDateTime>,
}

/// Research report listed on the report board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub title: String,
    /// Listing date exactly as shown on the board (`YYYY.MM.DD`)
    pub date: String,
    pub link: Option<String>,
}

impl ReportEntry {
    pub fn id(&self) -> ReportId {
        ReportId {
            date: self.date.clone(),
            title: self.title.clone(),
        }
    }
}

/// Ledger identity of a downloaded report
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportId {
    pub date: String,
    pub title: String,
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date, self.title)
    }
}

/// Report saved to the working folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFile {
    pub title: String,
    pub date: String,
    pub path: PathBuf,
}

/// Source-specific structured item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Disclosure(Disclosure),
    Price(PriceBar),
    Index(IndexLevel),
    Indicator(IndicatorReading),
    News(NewsItem),
    Report(ReportFile),
}

/// Outcome of one source for one run
///
/// An unavailable section always carries a non-empty placeholder, so
/// renderers can treat every section the same way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResult {
    available: bool,
    raw_records: Vec<Record>,
    rendered_text: String,
}

impl SectionResult {
    pub fn populated(raw_records: Vec<Record>, rendered_text: impl Into<String>) -> Self {
        let rendered_text = rendered_text.into();
        let rendered_text = if rendered_text.trim().is_empty() {
            NO_DATA_TEXT.to_string()
        } else {
            rendered_text
        };
        Self {
            available: true,
            raw_records,
            rendered_text,
        }
    }

    pub fn unavailable(placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        let rendered_text = if placeholder.trim().is_empty() {
            UNAVAILABLE_PLACEHOLDER.to_string()
        } else {
            placeholder
        };
        Self {
            available: false,
            raw_records: Vec::new(),
            rendered_text,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn raw_records(&self) -> &[Record] {
        &self.raw_records
    }

    pub fn rendered_text(&self) -> &str {
        &self.rendered_text
    }
}

/// Immutable result of one aggregation pass
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    run_timestamp: NaiveDateTime,
    variant: VariantSettings,
    sections: BTreeMap<SourceKey, SectionResult>,
}

impl Snapshot {
    /// Build a snapshot; keys missing from `sections` get the not-configured placeholder
    pub fn new(
        run_timestamp: NaiveDateTime,
        variant: VariantSettings,
        mut sections: BTreeMap<SourceKey, SectionResult>,
    ) -> Self {
        for key in SourceKey::ALL {
            sections
                .entry(key)
                .or_insert_with(|| SectionResult::unavailable(NOT_CONFIGURED_PLACEHOLDER));
        }
        Self {
            run_timestamp,
            variant,
            sections,
        }
    }

    pub fn run_timestamp(&self) -> NaiveDateTime {
        self.run_timestamp
    }

    pub fn variant(&self) -> &VariantSettings {
        &self.variant
    }

    pub fn section(&self, key: SourceKey) -> Option<&SectionResult> {
        self.sections.get(&key)
    }

    /// Sections in composition order
    pub fn sections(&self) -> impl Iterator<Item = (SourceKey, &SectionResult)> {
        self.sections.iter().map(|(key, section)| (*key, section))
    }

    pub fn available_count(&self) -> usize {
        self.sections.values().filter(|s| s.is_available()).count()
    }

    pub fn total_count(&self) -> usize {
        self.sections.len()
    }
}

/// Bounds handed to every adapter fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub as_of: NaiveDateTime,
    pub days_back: u32,
    pub news_max_hours: u32,
    /// Trading day whose prices the market section reports
    pub market_date: NaiveDate,
    pub max_disclosures: usize,
    pub max_news: usize,
}

impl FetchWindow {
    pub fn for_variant(settings: &VariantSettings, as_of: NaiveDateTime) -> Self {
        Self {
            as_of,
            days_back: settings.lookback.days_back,
            news_max_hours: settings.lookback.news_max_hours,
            market_date: trading_day_before(as_of.date(), settings.lookback.market_day_offset),
            max_disclosures: settings.limits.max_disclosures,
            max_news: settings.limits.max_news,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.as_of.date() - Duration::days(i64::from(self.days_back))
    }

    pub fn end_date(&self) -> NaiveDate {
        self.as_of.date()
    }

    /// Oldest publication time a news item may have
    pub fn news_cutoff(&self) -> NaiveDateTime {
        self.as_of - Duration::hours(i64::from(self.news_max_hours))
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Step back `offset` weekdays from `date`, rolling weekends back to Friday
///
/// Exchange holidays are not modelled; a holiday simply yields an empty market section.
pub fn trading_day_before(date: NaiveDate, offset: u32) -> NaiveDate {
    let mut day = date;
    while is_weekend(day) {
        day -= Duration::days(1);
    }
    for _ in 0..offset {
        day -= Duration::days(1);
        while is_weekend(day) {
            day -= Duration::days(1);
        }
    }
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::ReportVariant;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_source_key_order_is_composition_order() {
        let mut keys = vec![
            SourceKey::News,
            SourceKey::Market,
            SourceKey::Disclosures,
            SourceKey::Macro,
        ];
        keys.sort();
        assert_eq!(keys, SourceKey::ALL.to_vec());
        assert_eq!("dart".parse::<SourceKey>().unwrap(), SourceKey::Disclosures);
        assert!("weather".parse::<SourceKey>().is_err());
    }

    #[test]
    fn test_unavailable_section_always_has_placeholder() {
        let section = SectionResult::unavailable("");
        assert!(!section.is_available());
        assert_eq!(section.rendered_text(), UNAVAILABLE_PLACEHOLDER);

        let section = SectionResult::populated(Vec::new(), "  ");
        assert!(section.is_available());
        assert_eq!(section.rendered_text(), NO_DATA_TEXT);
    }

    #[test]
    fn test_snapshot_fills_every_key() {
        let mut sections = BTreeMap::new();
        sections.insert(SourceKey::News, SectionResult::populated(Vec::new(), "- headline"));
        let snapshot = Snapshot::new(
            at(2024, 1, 2, 8),
            ReportVariant::PreOpen.default_settings(),
            sections,
        );

        assert_eq!(snapshot.total_count(), 4);
        assert_eq!(snapshot.available_count(), 1);
        assert_eq!(
            snapshot.section(SourceKey::Market).unwrap().rendered_text(),
            NOT_CONFIGURED_PLACEHOLDER
        );
        let order: Vec<SourceKey> = snapshot.sections().map(|(k, _)| k).collect();
        assert_eq!(order, SourceKey::ALL.to_vec());
    }

    #[test]
    fn test_trading_day_before_skips_weekends() {
        // 2024-01-08 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(trading_day_before(monday, 0), monday);
        assert_eq!(trading_day_before(monday, 1), friday);

        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(trading_day_before(sunday, 0), friday);
    }

    #[test]
    fn test_fetch_window_for_pre_open() {
        let settings = ReportVariant::PreOpen.default_settings();
        let window = FetchWindow::for_variant(&settings, at(2024, 1, 3, 8));

        assert_eq!(window.market_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(window.news_cutoff(), at(2024, 1, 2, 20));
        assert_eq!(window.max_disclosures, 20);
    }

    #[test]
    fn test_disclosure_display_date() {
        let disclosure = Disclosure {
            corp_name: "Samsung Electronics".to_string(),
            stock_code: "005930".to_string(),
            report_name: "Quarterly report".to_string(),
            receipt_no: "20240102000001".to_string(),
            receipt_date: "20240102".to_string(),
            filer: "Samsung Electronics".to_string(),
        };
        assert_eq!(disclosure.display_date(), "2024-01-02");
    }

    #[test]
    fn test_report_id_display() {
        let entry = ReportEntry {
            title: "Semiconductor outlook".to_string(),
            date: "2024.01.01".to_string(),
            link: None,
        };
        assert_eq!(entry.id().to_string(), "2024.01.01_Semiconductor outlook");
    }
}
