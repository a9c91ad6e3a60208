//! Index and watch-list prices from Yahoo Finance
//!
//! KRX tickers map to Yahoo symbols by suffix: `005930` becomes `005930.KS`.
//! KOSDAQ names need an explicit `.KQ` suffix in the watch list.

use crate::format::{count, signed, signed_pct, thousands};
use async_trait::async_trait;
use briefing_core::config::WatchItem;
use briefing_core::{
    FetchWindow, IndexLevel, PriceBar, Record, SourceAdapter, SourceError, SourceKey,
};
use chrono::{DateTime, Duration, NaiveDate};
use time::OffsetDateTime;
use tracing::{instrument, warn};
use yahoo_finance_api as yahoo;

const ADAPTER: &str = "Yahoo Finance";
/// Extra calendar days fetched so holidays still leave a previous close
const HISTORY_PADDING_DAYS: i64 = 5;
/// Korea Standard Time offset used to date daily bars
const KST_OFFSET_HOURS: i64 = 9;

/// Daily bar reduced to what the briefing needs
#[derive(Debug, Clone, PartialEq)]
struct DailyBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Map a watch-list code to a Yahoo symbol
pub fn yahoo_symbol(code: &str) -> String {
    let code = code.trim();
    if code.starts_with('^') || code.contains('.') {
        code.to_string()
    } else {
        format!("{code}.KS")
    }
}

/// Latest bar on or before `market_date` and the close before it
fn latest_with_previous(
    bars: &[DailyBar],
    market_date: NaiveDate,
) -> Option<(DailyBar, Option<f64>)> {
    let mut eligible: Vec<&DailyBar> = bars.iter().filter(|b| b.date <= market_date).collect();
    eligible.sort_by_key(|b| b.date);
    let latest = eligible.pop()?;
    let previous = eligible.last().map(|b| b.close);
    Some((latest.clone(), previous))
}

fn change_pct(close: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((close / previous - 1.0) * 100.0)
    }
}

/// Market section adapter
pub struct MarketAdapter {
    indices: Vec<WatchItem>,
    watchlist: Vec<WatchItem>,
}

impl MarketAdapter {
    pub fn new(indices: Vec<WatchItem>, watchlist: Vec<WatchItem>) -> Self {
        Self { indices, watchlist }
    }

    async fn history(
        &self,
        provider: &yahoo::YahooConnector,
        symbol: &str,
        window: &FetchWindow,
    ) -> Result<Vec<DailyBar>, SourceError> {
        let start_date = window.market_date
            - Duration::days(i64::from(window.days_back) + HISTORY_PADDING_DAYS);
        let end_date = window.market_date + Duration::days(1);

        let to_odt = |date: NaiveDate| {
            let ts = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
            OffsetDateTime::from_unix_timestamp(ts)
                .map_err(|e| SourceError::parse(ADAPTER, format!("Invalid timestamp: {e}")))
        };

        let response = provider
            .get_quote_history(symbol, to_odt(start_date)?, to_odt(end_date)?)
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, format!("{symbol}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| SourceError::parse(ADAPTER, format!("{symbol}: {e}")))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                let ts = i64::try_from(q.timestamp).ok()?;
                let date = (DateTime::from_timestamp(ts, 0)? + Duration::hours(KST_OFFSET_HOURS))
                    .date_naive();
                Some(DailyBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for MarketAdapter {
    fn key(&self) -> SourceKey {
        SourceKey::Market
    }

    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn is_available(&self) -> bool {
        !self.indices.is_empty() || !self.watchlist.is_empty()
    }

    fn status_detail(&self) -> String {
        format!(
            "{} indices, {} watch-list stocks (no key required)",
            self.indices.len(),
            self.watchlist.len()
        )
    }

    #[instrument(skip(self, window), fields(adapter = ADAPTER, market_date = %window.market_date))]
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Record>, SourceError> {
        let provider = yahoo::YahooConnector::new().map_err(|e| SourceError::fetch(ADAPTER, e))?;

        let mut records = Vec::new();
        let mut failures = 0;
        let total = self.indices.len() + self.watchlist.len();

        for item in &self.indices {
            let symbol = yahoo_symbol(&item.code);
            match self.history(&provider, &symbol, window).await {
                Ok(bars) => {
                    if let Some((bar, previous)) = latest_with_previous(&bars, window.market_date) {
                        let previous = previous.unwrap_or(bar.close);
                        records.push(Record::Index(IndexLevel {
                            name: item.name.clone(),
                            symbol,
                            date: bar.date,
                            close: bar.close,
                            change: bar.close - previous,
                            change_pct: change_pct(bar.close, previous).unwrap_or(0.0),
                        }));
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("Failed to get {} from Yahoo Finance: {}", symbol, e);
                }
            }
        }

        for item in &self.watchlist {
            let symbol = yahoo_symbol(&item.code);
            match self.history(&provider, &symbol, window).await {
                Ok(bars) => {
                    if let Some((bar, previous)) = latest_with_previous(&bars, window.market_date) {
                        records.push(Record::Price(PriceBar {
                            symbol: item.code.clone(),
                            name: item.name.clone(),
                            date: bar.date,
                            open: bar.open,
                            high: bar.high,
                            low: bar.low,
                            close: bar.close,
                            volume: bar.volume,
                            change_pct: previous.and_then(|p| change_pct(bar.close, p)),
                        }));
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("Failed to get {} from Yahoo Finance: {}", symbol, e);
                }
            }
        }

        if total > 0 && failures == total {
            return Err(SourceError::fetch(ADAPTER, "every symbol request failed"));
        }

        Ok(records)
    }

    fn format_for_briefing(&self, records: &[Record], window: &FetchWindow) -> String {
        let mut index_lines = Vec::new();
        let mut stock_lines = Vec::new();
        let mut latest_date: Option<NaiveDate> = None;

        for record in records {
            match record {
                Record::Index(level) => {
                    latest_date = latest_date.max(Some(level.date));
                    index_lines.push(format!(
                        "- **{}**: {} ({}, {})",
                        level.name,
                        thousands(level.close, 2),
                        signed(level.change, 2),
                        signed_pct(level.change_pct)
                    ));
                }
                Record::Price(bar) => {
                    latest_date = latest_date.max(Some(bar.date));
                    let change = bar
                        .change_pct
                        .map(|pct| format!("{}, ", signed_pct(pct)))
                        .unwrap_or_default();
                    stock_lines.push(format!(
                        "- **{}** ({}): {} KRW ({}volume {})",
                        bar.name,
                        bar.symbol,
                        thousands(bar.close, 0),
                        change,
                        count(bar.volume)
                    ));
                }
                _ => {}
            }
        }

        if index_lines.is_empty() && stock_lines.is_empty() {
            return format!("No trading data for {}.", window.market_date);
        }

        let mut lines = vec![format!(
            "_Trading day: {}_",
            latest_date.unwrap_or(window.market_date)
        )];
        if !index_lines.is_empty() {
            lines.push(String::new());
            lines.push("### Market Indices".to_string());
            lines.extend(index_lines);
        }
        if !stock_lines.is_empty() {
            lines.push(String::new());
            lines.push("### Watch List".to_string());
            lines.extend(stock_lines);
        }
        lines.join("\n")
    }
}
