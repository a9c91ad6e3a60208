//! Configuration for briefing runs
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, then environment variables (usually loaded from `.env`).

use crate::error::{BriefingError, Result};
use crate::variant::{ReportVariant, VariantSettings};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// API keys for external services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub dart_api_key: Option<String>,
    pub ecos_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

/// Instrument followed by the market section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchItem {
    /// Exchange code (`005930`) or full ticker (`^KS11`, `005930.KS`)
    pub code: String,
    pub name: String,
}

impl WatchItem {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl FromStr for WatchItem {
    type Err = String;

    /// Parses `CODE` or `CODE:Name`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (code, name) = match s.split_once(':') {
            Some((code, name)) => (code.trim(), name.trim()),
            None => (s.trim(), s.trim()),
        };
        if code.is_empty() {
            return Err(format!("invalid watch-list entry '{s}'"));
        }
        let name = if name.is_empty() { code } else { name };
        Ok(Self::new(code, name))
    }
}

/// RSS feed to poll for headlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// ECOS statistic to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCode {
    pub name: String,
    pub stat_code: String,
    pub item_code: String,
    /// Cycle code: `D`, `M`, `Q` or `A`
    pub period: String,
    pub days_back: u32,
    pub unit: String,
}

/// FRED series used for the comparison economy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FredSeries {
    pub name: String,
    pub series_id: String,
    pub unit: String,
}

/// LLM service used for narratives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeProvider {
    /// OpenAI or any OpenAI-compatible endpoint
    #[default]
    OpenAi,
    Anthropic,
}

impl fmt::Display for NarrativeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl NarrativeProvider {
    /// Model used when a provider is chosen without naming one
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl FromStr for NarrativeProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(format!("unknown narrative provider '{other}'")),
        }
    }
}

/// Narrative generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeSettings {
    /// Global switch; a run must also request a narrative
    pub enabled: bool,
    pub provider: NarrativeProvider,
    pub model: String,
    /// Override for OpenAI-compatible endpoints
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: NarrativeProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 120,
        }
    }
}

/// Research-report pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub listing_url: String,
    /// Folder holding downloaded PDFs and extracted texts
    pub work_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub output_dir: PathBuf,
    pub download_delay_secs: u64,
    /// Characters kept from each report text
    pub char_budget: usize,
    pub max_tokens: usize,
    /// Provider for the digest; falls back to the narrative provider when unset
    pub provider: Option<NarrativeProvider>,
    /// Model for the digest; falls back to the narrative model, or to the
    /// provider's default model when `provider` differs from the narrative one
    pub model: Option<String>,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            listing_url:
                "https://securities.koreainvestment.com/main/research/research/Strategy.jsp?jkGubun=6"
                    .to_string(),
            work_dir: PathBuf::from("notes/auto_reports"),
            ledger_path: PathBuf::from("notes/auto_reports/download_log.json"),
            output_dir: PathBuf::from("results/daily_reports"),
            download_delay_secs: 2,
            char_budget: 15_000,
            max_tokens: 4096,
            provider: None,
            model: None,
        }
    }
}

impl ResearchSettings {
    pub fn download_delay(&self) -> Duration {
        Duration::from_secs(self.download_delay_secs)
    }
}

/// Work triggered by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduledJob {
    Briefing(ReportVariant),
    Research,
}

impl fmt::Display for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Briefing(variant) => write!(f, "{variant}"),
            Self::Research => f.write_str("research"),
        }
    }
}

impl FromStr for ScheduledJob {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("research") {
            return Ok(Self::Research);
        }
        s.parse::<ReportVariant>().map(Self::Briefing)
    }
}

impl TryFrom<String> for ScheduledJob {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduledJob> for String {
    fn from(job: ScheduledJob) -> Self {
        job.to_string()
    }
}

/// One daily trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Local wall-clock time, `HH:MM`
    pub at: String,
    pub job: ScheduledJob,
    /// Request a narrative for briefing jobs
    #[serde(default)]
    pub narrative: bool,
}

impl ScheduleSpec {
    pub fn new(at: impl Into<String>, job: ScheduledJob, narrative: bool) -> Self {
        Self {
            at: at.into(),
            job,
            narrative,
        }
    }

    pub fn time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.at.trim(), "%H:%M")
            .map_err(|e| BriefingError::Config(format!("invalid schedule time '{}': {e}", self.at)))
    }
}

/// Partial override of a variant's built-in settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantOverride {
    pub title: Option<String>,
    pub file_suffix: Option<String>,
    pub description: Option<String>,
    pub days_back: Option<u32>,
    pub news_max_hours: Option<u32>,
    pub market_day_offset: Option<u32>,
    pub max_disclosures: Option<usize>,
    pub max_news: Option<usize>,
    pub market_header: Option<String>,
    pub indicators_header: Option<String>,
    pub disclosures_header: Option<String>,
    pub news_header: Option<String>,
}

impl VariantOverride {
    fn apply(&self, settings: &mut VariantSettings) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        set(&mut settings.title, self.title.as_ref());
        set(&mut settings.file_suffix, self.file_suffix.as_ref());
        set(&mut settings.description, self.description.as_ref());
        set(&mut settings.lookback.days_back, self.days_back.as_ref());
        set(&mut settings.lookback.news_max_hours, self.news_max_hours.as_ref());
        set(&mut settings.lookback.market_day_offset, self.market_day_offset.as_ref());
        set(&mut settings.limits.max_disclosures, self.max_disclosures.as_ref());
        set(&mut settings.limits.max_news, self.max_news.as_ref());
        set(&mut settings.headers.market, self.market_header.as_ref());
        set(&mut settings.headers.indicators, self.indicators_header.as_ref());
        set(&mut settings.headers.disclosures, self.disclosures_header.as_ref());
        set(&mut settings.headers.news, self.news_header.as_ref());
    }
}

/// Complete configuration of the briefing system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    pub credentials: Credentials,

    /// Stocks reported in the market section
    pub watchlist: Vec<WatchItem>,

    /// Indices reported ahead of the watch list
    pub indices: Vec<WatchItem>,

    pub feeds: Vec<FeedSource>,

    /// A headline is kept when its title or summary contains any of these
    pub news_keywords: Vec<String>,

    pub stat_codes: Vec<StatCode>,

    pub fred_series: Vec<FredSeries>,

    /// Per-variant overrides keyed by variant key (`pre-open`, ...)
    pub variants: BTreeMap<String, VariantOverride>,

    pub narrative: NarrativeSettings,

    /// Folder for published briefings
    pub output_dir: PathBuf,

    pub research: ResearchSettings,

    pub schedule: Vec<ScheduleSpec>,

    /// Timeout applied to every data-source HTTP request
    pub request_timeout_secs: u64,
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            watchlist: vec![
                WatchItem::new("005930", "Samsung Electronics"),
                WatchItem::new("000660", "SK Hynix"),
            ],
            indices: vec![
                WatchItem::new("^KS11", "KOSPI"),
                WatchItem::new("^KQ11", "KOSDAQ"),
            ],
            feeds: vec![
                FeedSource {
                    name: "Hankyung".to_string(),
                    url: "https://www.hankyung.com/feed/all-news".to_string(),
                },
                FeedSource {
                    name: "Maeil Business".to_string(),
                    url: "https://www.mk.co.kr/rss/30000001/".to_string(),
                },
                FeedSource {
                    name: "Edaily".to_string(),
                    url: "https://rss.edaily.co.kr/edaily_economy.xml".to_string(),
                },
            ],
            news_keywords: default_news_keywords(),
            stat_codes: vec![
                StatCode {
                    name: "BOK base rate".to_string(),
                    stat_code: "722Y001".to_string(),
                    item_code: "0101000".to_string(),
                    period: "D".to_string(),
                    days_back: 30,
                    unit: "%".to_string(),
                },
                StatCode {
                    name: "USD/KRW".to_string(),
                    stat_code: "731Y003".to_string(),
                    item_code: "0000001".to_string(),
                    period: "D".to_string(),
                    days_back: 7,
                    unit: "KRW".to_string(),
                },
            ],
            fred_series: vec![
                FredSeries {
                    name: "US federal funds rate".to_string(),
                    series_id: "FEDFUNDS".to_string(),
                    unit: "%".to_string(),
                },
                FredSeries {
                    name: "US 10Y Treasury".to_string(),
                    series_id: "DGS10".to_string(),
                    unit: "%".to_string(),
                },
            ],
            variants: BTreeMap::new(),
            narrative: NarrativeSettings::default(),
            output_dir: PathBuf::from("notes/daily_briefing"),
            research: ResearchSettings::default(),
            schedule: default_schedule(),
            request_timeout_secs: 10,
        }
    }
}

fn default_news_keywords() -> Vec<String> {
    [
        "주식", "코스피", "코스닥", "증시", "금리", "환율", "삼성전자", "SK하이닉스", "반도체",
        "배당", "실적", "외국인", "기관", "매수", "매도", "상승", "하락", "IPO", "공모", "상장",
        "투자", "펀드", "ETF", "금통위", "기준금리", "인플레이션", "GDP", "KOSPI",
    ]
    .iter()
    .map(|k| (*k).to_string())
    .collect()
}

fn default_schedule() -> Vec<ScheduleSpec> {
    vec![
        ScheduleSpec::new("07:30", ScheduledJob::Research, false),
        ScheduleSpec::new("08:00", ScheduledJob::Briefing(ReportVariant::PreOpen), true),
        ScheduleSpec::new("12:30", ScheduledJob::Briefing(ReportVariant::Intraday), true),
        ScheduleSpec::new("18:00", ScheduledJob::Briefing(ReportVariant::PostClose), true),
    ]
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl BriefingConfig {
    /// Create a new configuration builder
    pub fn builder() -> BriefingConfigBuilder {
        BriefingConfigBuilder::default()
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BriefingError::Config(format!("invalid config file: {e}")))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BriefingError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> Self {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    ///
    /// Unparseable values are ignored with a warning so a typo in `.env`
    /// never prevents a run.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(key) = get("DART_API_KEY") {
            self.credentials.dart_api_key = Some(key);
        }
        if let Some(key) = get("ECOS_API_KEY") {
            self.credentials.ecos_api_key = Some(key);
        }
        if let Some(key) = get("FRED_API_KEY") {
            self.credentials.fred_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.credentials.openai_api_key = Some(key);
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.credentials.anthropic_api_key = Some(key);
        }

        if let Some(list) = get("WATCHLIST_STOCKS") {
            let items: Vec<WatchItem> = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| match s.parse::<WatchItem>() {
                    Ok(item) => Some(item),
                    Err(e) => {
                        tracing::warn!("Ignoring watch-list entry: {}", e);
                        None
                    }
                })
                .collect();
            if !items.is_empty() {
                self.watchlist = items;
            }
        }

        if let Some(value) = get("AI_ENABLED") {
            match parse_flag(&value) {
                Some(flag) => self.narrative.enabled = flag,
                None => tracing::warn!("Ignoring AI_ENABLED={}: expected true or false", value),
            }
        }
        if let Some(value) = get("AI_PROVIDER") {
            match value.parse() {
                Ok(provider) => self.narrative.provider = provider,
                Err(e) => tracing::warn!("Ignoring AI_PROVIDER: {}", e),
            }
        }
        if let Some(model) = get("AI_MODEL") {
            self.narrative.model = model;
        }
        if let Some(value) = get("AI_MAX_TOKENS") {
            match value.parse() {
                Ok(tokens) => self.narrative.max_tokens = tokens,
                Err(_) => tracing::warn!("Ignoring AI_MAX_TOKENS={}: not a number", value),
            }
        }
        if let Some(value) = get("AI_TEMPERATURE") {
            match value.parse() {
                Ok(temperature) => self.narrative.temperature = temperature,
                Err(_) => tracing::warn!("Ignoring AI_TEMPERATURE={}: not a number", value),
            }
        }
        if let Some(base) = get("OPENAI_API_BASE") {
            self.narrative.api_base = Some(base);
        }
        if let Some(dir) = get("BRIEFING_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(BriefingError::Config(format!(
                "narrative temperature must be between 0.0 and 2.0, got {}",
                self.narrative.temperature
            )));
        }

        if self.narrative.max_tokens == 0 {
            return Err(BriefingError::Config(
                "narrative max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.narrative.model.trim().is_empty() {
            return Err(BriefingError::Config("narrative model must not be empty".to_string()));
        }

        if self.research.char_budget == 0 {
            return Err(BriefingError::Config(
                "research char_budget must be greater than 0".to_string(),
            ));
        }

        if self.research.model.as_ref().is_some_and(|m| m.trim().is_empty()) {
            return Err(BriefingError::Config("research model must not be empty".to_string()));
        }

        if self.research.max_tokens == 0 {
            return Err(BriefingError::Config(
                "research max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(BriefingError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        for key in self.variants.keys() {
            key.parse::<ReportVariant>().map_err(BriefingError::Config)?;
        }

        for variant in ReportVariant::ALL {
            if self.variant_settings(variant).file_suffix.trim().is_empty() {
                return Err(BriefingError::Config(format!(
                    "file_suffix for {variant} must not be empty"
                )));
            }
        }

        for spec in &self.schedule {
            spec.time()?;
        }

        Ok(())
    }

    /// Built-in settings for `variant` with any configured override applied
    pub fn variant_settings(&self, variant: ReportVariant) -> VariantSettings {
        let mut settings = variant.default_settings();
        let overrides = self
            .variants
            .iter()
            .filter(|(key, _)| key.parse::<ReportVariant>().ok() == Some(variant));
        for (_, override_) in overrides {
            override_.apply(&mut settings);
        }
        settings
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// API key for the configured narrative provider
    pub fn narrative_api_key(&self) -> Option<&str> {
        self.api_key_for(self.narrative.provider)
    }

    pub fn api_key_for(&self, provider: NarrativeProvider) -> Option<&str> {
        match provider {
            NarrativeProvider::OpenAi => self.credentials.openai_api_key.as_deref(),
            NarrativeProvider::Anthropic => self.credentials.anthropic_api_key.as_deref(),
        }
    }

    /// Narrative settings with the research provider and model overrides applied
    ///
    /// Switching provider drops `api_base`, which belongs to the narrative provider.
    pub fn research_narrative_settings(&self) -> NarrativeSettings {
        let mut settings = self.narrative.clone();
        if let Some(provider) = self.research.provider.filter(|p| *p != settings.provider) {
            settings.provider = provider;
            settings.model = provider.default_model().to_string();
            settings.api_base = None;
        }
        if let Some(model) = &self.research.model {
            settings.model.clone_from(model);
        }
        settings
    }
}

/// Builder for BriefingConfig
#[derive(Debug, Default)]
pub struct BriefingConfigBuilder {
    credentials: Option<Credentials>,
    watchlist: Option<Vec<WatchItem>>,
    feeds: Option<Vec<FeedSource>>,
    narrative: Option<NarrativeSettings>,
    output_dir: Option<PathBuf>,
    research: Option<ResearchSettings>,
    schedule: Option<Vec<ScheduleSpec>>,
    variants: BTreeMap<String, VariantOverride>,
    request_timeout_secs: Option<u64>,
}

impl BriefingConfigBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn watchlist(mut self, watchlist: Vec<WatchItem>) -> Self {
        self.watchlist = Some(watchlist);
        self
    }

    pub fn feeds(mut self, feeds: Vec<FeedSource>) -> Self {
        self.feeds = Some(feeds);
        self
    }

    pub fn narrative(mut self, narrative: NarrativeSettings) -> Self {
        self.narrative = Some(narrative);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn research(mut self, research: ResearchSettings) -> Self {
        self.research = Some(research);
        self
    }

    pub fn schedule(mut self, schedule: Vec<ScheduleSpec>) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Override settings for one variant
    pub fn variant(mut self, variant: ReportVariant, override_: VariantOverride) -> Self {
        self.variants.insert(variant.key().to_string(), override_);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BriefingConfig> {
        let defaults = BriefingConfig::default();

        let config = BriefingConfig {
            credentials: self.credentials.unwrap_or(defaults.credentials),
            watchlist: self.watchlist.unwrap_or(defaults.watchlist),
            feeds: self.feeds.unwrap_or(defaults.feeds),
            narrative: self.narrative.unwrap_or(defaults.narrative),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            research: self.research.unwrap_or(defaults.research),
            schedule: self.schedule.unwrap_or(defaults.schedule),
            variants: self.variants,
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BriefingConfig::default();
        assert!(!config.narrative.enabled);
        assert_eq!(config.watchlist.len(), 2);
        assert_eq!(config.feeds.len(), 3);
        assert_eq!(config.schedule.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let config = BriefingConfig::default().apply_env_with(lookup_from(&[
            ("DART_API_KEY", "dart-key"),
            ("ECOS_API_KEY", "  "),
            ("WATCHLIST_STOCKS", "005930:Samsung Electronics, 035420"),
            ("AI_ENABLED", "true"),
            ("AI_PROVIDER", "anthropic"),
            ("AI_MAX_TOKENS", "1500"),
            ("AI_TEMPERATURE", "warm"),
        ]));

        assert_eq!(config.credentials.dart_api_key.as_deref(), Some("dart-key"));
        assert_eq!(config.credentials.ecos_api_key, None);
        assert_eq!(config.watchlist.len(), 2);
        assert_eq!(config.watchlist[1], WatchItem::new("035420", "035420"));
        assert!(config.narrative.enabled);
        assert_eq!(config.narrative.provider, NarrativeProvider::Anthropic);
        assert_eq!(config.narrative.max_tokens, 1500);
        assert!((config.narrative.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = BriefingConfig::from_toml_str(
            r#"
            output_dir = "out"

            [narrative]
            enabled = true
            model = "gpt-4o"

            [variants.pre-open]
            max_news = 5
            news_header = "Overnight"

            [[schedule]]
            at = "09:15"
            job = "intraday"
            narrative = true
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.narrative.enabled);
        assert_eq!(config.narrative.model, "gpt-4o");
        assert_eq!(config.narrative.max_tokens, 2000);
        assert_eq!(config.schedule.len(), 1);
        assert_eq!(config.schedule[0].job, ScheduledJob::Briefing(ReportVariant::Intraday));

        let settings = config.variant_settings(ReportVariant::PreOpen);
        assert_eq!(settings.limits.max_news, 5);
        assert_eq!(settings.headers.news, "Overnight");
        assert_eq!(settings.headers.market, "Previous Session Close");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config =
            BriefingConfig::from_toml_str(include_str!("../../../briefing.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.len(), 4);
        assert_eq!(config.schedule[0].job, ScheduledJob::Research);
        assert_eq!(config.research.provider, Some(NarrativeProvider::Anthropic));
        assert_eq!(
            config.research_narrative_settings().model,
            "claude-sonnet-4-20250514"
        );
        assert_eq!(
            config.variant_settings(ReportVariant::PreOpen).headers.news,
            "Overnight Headlines"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("briefing.toml");
        std::fs::write(
            &path,
            "request_timeout_secs = 20\n\n[research]\nchar_budget = 8000\n",
        )
        .unwrap();

        let config = BriefingConfig::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.research.char_budget, 8000);
        assert_eq!(config.research.max_tokens, 4096);

        std::fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();
        assert!(matches!(BriefingConfig::load(&path), Err(BriefingError::Config(_))));
        assert!(BriefingConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = BriefingConfig::default();
        config.narrative.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = BriefingConfig::default();
        config.schedule = vec![ScheduleSpec::new("25:99", ScheduledJob::Research, false)];
        assert!(config.validate().is_err());

        let mut config = BriefingConfig::default();
        config.variants.insert("weekly".to_string(), VariantOverride::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = BriefingConfig::builder()
            .output_dir("briefings")
            .request_timeout_secs(30)
            .variant(
                ReportVariant::PostClose,
                VariantOverride {
                    file_suffix: Some("close".to_string()),
                    ..Default::default()
                },
            )
            .build()
            .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("briefings"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.variant_settings(ReportVariant::PostClose).file_suffix, "close");

        let result = BriefingConfig::builder().request_timeout_secs(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_watch_item_parsing() {
        let item: WatchItem = "005930:Samsung Electronics".parse().unwrap();
        assert_eq!(item.code, "005930");
        assert_eq!(item.name, "Samsung Electronics");
        assert!(":nameless".parse::<WatchItem>().is_err());
    }

    #[test]
    fn test_narrative_api_key_follows_provider() {
        let mut config = BriefingConfig::default();
        config.credentials.anthropic_api_key = Some("sk-ant".to_string());
        assert_eq!(config.narrative_api_key(), None);
        config.narrative.provider = NarrativeProvider::Anthropic;
        assert_eq!(config.narrative_api_key(), Some("sk-ant"));
    }

    #[test]
    fn test_research_narrative_settings() {
        let mut config = BriefingConfig::default();
        config.narrative.api_base = Some("http://localhost:1234/v1".to_string());
        assert_eq!(config.research_narrative_settings(), config.narrative);

        config.research.model = Some("gpt-4o".to_string());
        let settings = config.research_narrative_settings();
        assert_eq!(settings.provider, NarrativeProvider::OpenAi);
        assert_eq!(settings.model, "gpt-4o");
        assert!(settings.api_base.is_some());

        config.research.model = None;
        config.research.provider = Some(NarrativeProvider::Anthropic);
        let settings = config.research_narrative_settings();
        assert_eq!(settings.provider, NarrativeProvider::Anthropic);
        assert_eq!(settings.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.api_base, None);
        assert_eq!(config.narrative.provider, NarrativeProvider::OpenAi);

        config.research.model = Some("claude-3-5-haiku-latest".to_string());
        assert_eq!(config.research_narrative_settings().model, "claude-3-5-haiku-latest");

        config.research.model = Some(" ".to_string());
        assert!(matches!(config.validate(), Err(BriefingError::Config(_))));
    }
}
