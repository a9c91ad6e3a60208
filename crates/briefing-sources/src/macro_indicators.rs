//! Macro indicator section: ECOS as the primary source, FRED for comparison

use crate::ecos::EcosClient;
use crate::format::{signed, thousands};
use crate::fred::FredClient;
use async_trait::async_trait;
use briefing_core::config::{FredSeries, StatCode};
use briefing_core::{FetchWindow, IndicatorReading, Record, SourceAdapter, SourceError, SourceKey};
use std::time::Duration;
use tracing::{instrument, warn};

const ADAPTER: &str = "ECOS";

/// Macro indicator adapter
///
/// Availability follows ECOS alone; FRED readings are appended when a key is
/// configured and silently skipped otherwise.
pub struct MacroAdapter {
    ecos: Option<EcosClient>,
    stat_codes: Vec<StatCode>,
    fred: Option<FredClient>,
    fred_series: Vec<FredSeries>,
}

impl MacroAdapter {
    pub fn new(
        ecos_api_key: Option<String>,
        stat_codes: Vec<StatCode>,
        fred_api_key: Option<String>,
        fred_series: Vec<FredSeries>,
        timeout: Duration,
    ) -> Self {
        Self {
            ecos: ecos_api_key.map(|key| EcosClient::new(key, timeout)),
            stat_codes,
            fred: fred_api_key.map(|key| FredClient::new(key, timeout)),
            fred_series,
        }
    }
}

fn format_value(value: f64, unit: &str) -> String {
    if unit == "%" {
        format!("{value:.2}%")
    } else if unit.is_empty() {
        thousands(value, 2)
    } else {
        format!("{} {unit}", thousands(value, 2))
    }
}

fn format_reading(reading: &IndicatorReading) -> String {
    let change = match reading.change {
        Some(change) if reading.unit == "%" => format!(" ({}%p)", signed(change, 2)),
        Some(change) => format!(" ({})", signed(change, 2)),
        None => String::new(),
    };
    format!(
        "- **{}**: {}{} _({})_",
        reading.name,
        format_value(reading.value, &reading.unit),
        change,
        reading.period
    )
}

#[async_trait]
impl SourceAdapter for MacroAdapter {
    fn key(&self) -> SourceKey {
        SourceKey::Macro
    }

    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn is_available(&self) -> bool {
        self.ecos.is_some()
    }

    fn status_detail(&self) -> String {
        let fred = if self.fred.is_some() {
            "FRED comparison enabled"
        } else {
            "FRED_API_KEY not set, comparison skipped"
        };
        if self.ecos.is_some() {
            format!("ready ({} statistics; {fred})", self.stat_codes.len())
        } else {
            "ECOS_API_KEY is not set".to_string()
        }
    }

    fn placeholder(&self) -> String {
        if self.is_available() {
            "_Macro indicators could not be retrieved from ECOS._".to_string()
        } else {
            "_ECOS API key is not configured. Set ECOS_API_KEY to enable macro indicators._"
                .to_string()
        }
    }

    #[instrument(skip(self, window), fields(adapter = ADAPTER))]
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Record>, SourceError> {
        let ecos = self
            .ecos
            .as_ref()
            .ok_or_else(|| SourceError::unavailable(ADAPTER, "ECOS_API_KEY is not set"))?;

        let as_of = window.end_date();
        let mut records = Vec::new();
        let mut failures = 0;

        for stat in &self.stat_codes {
            match ecos.latest(stat, as_of).await {
                Ok(Some(reading)) => records.push(Record::Indicator(reading)),
                Ok(None) => warn!(
                    "No ECOS data for {} in the last {} days",
                    stat.name, stat.days_back
                ),
                Err(e) => {
                    failures += 1;
                    warn!("Failed to get {} from ECOS: {}", stat.name, e);
                }
            }
        }

        if !self.stat_codes.is_empty() && failures == self.stat_codes.len() {
            return Err(SourceError::fetch(ADAPTER, "every statistic request failed"));
        }

        if let Some(fred) = &self.fred {
            for series in &self.fred_series {
                match fred.latest(series).await {
                    Ok(Some(reading)) => records.push(Record::Indicator(reading)),
                    Ok(None) => warn!("No FRED observations for {}", series.series_id),
                    Err(e) => warn!("Failed to get {} from FRED: {}", series.series_id, e),
                }
            }
        }

        Ok(records)
    }

    fn format_for_briefing(&self, records: &[Record], _window: &FetchWindow) -> String {
        let readings: Vec<&IndicatorReading> = records
            .iter()
            .filter_map(|record| match record {
                Record::Indicator(reading) => Some(reading),
                _ => None,
            })
            .collect();

        if readings.is_empty() {
            return "No indicator readings were published in this window.".to_string();
        }

        let (domestic, comparison): (Vec<_>, Vec<_>) =
            readings.into_iter().partition(|r| r.source == ADAPTER);

        let mut lines: Vec<String> = domestic.iter().map(|r| format_reading(r)).collect();
        if !comparison.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("**United States (FRED)**".to_string());
            lines.extend(comparison.iter().map(|r| format_reading(r)));
        }
        lines.join("\n")
    }
}
