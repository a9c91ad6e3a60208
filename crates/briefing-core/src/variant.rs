//! Report variants and their settings
//!
//! The three variants share one composition template. They differ only in
//! labels, lookback windows and item limits, all carried by [`VariantSettings`].

use crate::model::SourceKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timed report configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportVariant {
    /// Before the market opens
    PreOpen,
    /// During the trading session
    Intraday,
    /// After the market closes
    PostClose,
}

impl ReportVariant {
    pub const ALL: [ReportVariant; 3] = [Self::PreOpen, Self::Intraday, Self::PostClose];

    /// Stable key used in configuration and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::PreOpen => "pre-open",
            Self::Intraday => "intraday",
            Self::PostClose => "post-close",
        }
    }

    /// Built-in settings for this variant
    pub fn default_settings(&self) -> VariantSettings {
        match self {
            Self::PreOpen => VariantSettings {
                variant: *self,
                title: "Morning Briefing".to_string(),
                file_suffix: "morning_briefing".to_string(),
                description:
                    "Previous session close, FX and rates, and overnight news ahead of the open"
                        .to_string(),
                lookback: Lookback {
                    days_back: 1,
                    news_max_hours: 12,
                    market_day_offset: 1,
                },
                limits: SectionLimits {
                    max_disclosures: 20,
                    max_news: 10,
                },
                headers: SectionHeaders {
                    market: "Previous Session Close".to_string(),
                    indicators: "FX / Rates".to_string(),
                    disclosures: "Key Disclosures (DART)".to_string(),
                    news: "Morning Headlines".to_string(),
                },
            },
            Self::Intraday => VariantSettings {
                variant: *self,
                title: "Midday Briefing".to_string(),
                file_suffix: "midday_briefing".to_string(),
                description: "Intraday prices, fresh disclosures, and news during the session"
                    .to_string(),
                lookback: Lookback {
                    days_back: 1,
                    news_max_hours: 6,
                    market_day_offset: 0,
                },
                limits: SectionLimits {
                    max_disclosures: 20,
                    max_news: 10,
                },
                headers: SectionHeaders {
                    market: "Intraday Market".to_string(),
                    indicators: "Macro Indicators".to_string(),
                    disclosures: "Today's Disclosures (DART)".to_string(),
                    news: "Key Headlines".to_string(),
                },
            },
            Self::PostClose => VariantSettings {
                variant: *self,
                title: "After-Market Briefing".to_string(),
                file_suffix: "aftermarket_briefing".to_string(),
                description: "Today's market moves, disclosures, and afternoon news after the close"
                    .to_string(),
                lookback: Lookback {
                    days_back: 1,
                    news_max_hours: 12,
                    market_day_offset: 0,
                },
                limits: SectionLimits {
                    max_disclosures: 20,
                    max_news: 15,
                },
                headers: SectionHeaders {
                    market: "Today's Market".to_string(),
                    indicators: "Macro Indicators".to_string(),
                    disclosures: "Today's Disclosures (DART)".to_string(),
                    news: "Afternoon Headlines".to_string(),
                },
            },
        }
    }
}

impl fmt::Display for ReportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre-open" | "preopen" | "morning" => Ok(Self::PreOpen),
            "intraday" | "midday" => Ok(Self::Intraday),
            "post-close" | "postclose" | "aftermarket" => Ok(Self::PostClose),
            other => Err(format!(
                "unknown report variant '{other}' (expected pre-open, intraday or post-close)"
            )),
        }
    }
}

/// How far back each source looks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    /// Disclosure window in days
    pub days_back: u32,
    /// News freshness window in hours
    pub news_max_hours: u32,
    /// Trading days to step back for price data (1 = previous session)
    pub market_day_offset: u32,
}

/// Per-section item limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLimits {
    pub max_disclosures: usize,
    pub max_news: usize,
}

/// Section heading text for each source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeaders {
    pub market: String,
    pub indicators: String,
    pub disclosures: String,
    pub news: String,
}

impl SectionHeaders {
    pub fn get(&self, key: SourceKey) -> &str {
        match key {
            SourceKey::Market => &self.market,
            SourceKey::Macro => &self.indicators,
            SourceKey::Disclosures => &self.disclosures,
            SourceKey::News => &self.news,
        }
    }
}

/// Resolved settings for one report variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSettings {
    pub variant: ReportVariant,
    pub title: String,
    pub file_suffix: String,
    pub description: String,
    pub lookback: Lookback,
    pub limits: SectionLimits,
    pub headers: SectionHeaders,
}

impl VariantSettings {
    pub fn key(&self) -> &'static str {
        self.variant.key()
    }

    /// Fixed footer line closing every briefing of this variant
    pub fn disclaimer(&self) -> String {
        format!(
            "*This {} was generated automatically. \
             Investment decisions remain the reader's own responsibility.*",
            self.title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("pre-open".parse::<ReportVariant>().unwrap(), ReportVariant::PreOpen);
        assert_eq!("Midday".parse::<ReportVariant>().unwrap(), ReportVariant::Intraday);
        assert_eq!("aftermarket".parse::<ReportVariant>().unwrap(), ReportVariant::PostClose);
        assert!("weekly".parse::<ReportVariant>().is_err());
    }

    #[test]
    fn test_key_round_trip() {
        for variant in ReportVariant::ALL {
            assert_eq!(variant.key().parse::<ReportVariant>().unwrap(), variant);
            assert_eq!(variant.default_settings().key(), variant.key());
        }
    }

    #[test]
    fn test_variants_differ_only_in_parameters() {
        let pre_open = ReportVariant::PreOpen.default_settings();
        let post_close = ReportVariant::PostClose.default_settings();

        assert_eq!(pre_open.lookback.market_day_offset, 1);
        assert_eq!(post_close.lookback.market_day_offset, 0);
        assert_ne!(pre_open.file_suffix, post_close.file_suffix);
        assert_ne!(pre_open.headers.market, post_close.headers.market);
    }

    #[test]
    fn test_disclaimer_mentions_title() {
        let settings = ReportVariant::Intraday.default_settings();
        assert!(settings.disclaimer().contains("Midday Briefing"));
        assert!(settings.disclaimer().starts_with('*'));
    }
}
