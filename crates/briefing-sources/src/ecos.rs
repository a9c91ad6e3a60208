//! Bank of Korea ECOS statistics client
//!
//! API Key: Free registration at https://ecos.bok.or.kr/api/

use crate::http::{self, SharedRateLimiter};
use briefing_core::config::StatCode;
use briefing_core::{IndicatorReading, SourceError};
use chrono::{Datelike, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::instrument;

const ECOS_BASE_URL: &str = "https://ecos.bok.or.kr/api/StatisticSearch";
const ADAPTER: &str = "ECOS";
/// Result code meaning "no data for the requested range"
const NO_DATA_CODE: &str = "INFO-200";

#[derive(Debug, Deserialize)]
struct EcosResponse {
    #[serde(rename = "StatisticSearch")]
    statistic_search: Option<StatisticSearch>,
    #[serde(rename = "RESULT")]
    result: Option<EcosResult>,
}

#[derive(Debug, Deserialize)]
struct StatisticSearch {
    #[serde(default)]
    row: Vec<EcosRow>,
}

#[derive(Debug, Deserialize)]
struct EcosResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE", default)]
    message: String,
}

/// One observation as returned by StatisticSearch
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EcosRow {
    #[serde(rename = "TIME")]
    pub time: String,
    #[serde(rename = "DATA_VALUE")]
    pub value: String,
}

/// Format a date for an ECOS cycle code
pub fn period_label(period: &str, date: NaiveDate) -> String {
    match period {
        "A" => date.format("%Y").to_string(),
        "Q" => format!("{}Q{}", date.year(), date.month0() / 3 + 1),
        "M" => date.format("%Y%m").to_string(),
        _ => date.format("%Y%m%d").to_string(),
    }
}

/// ECOS StatisticSearch client
pub struct EcosClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl EcosClient {
    pub fn new(api_key: impl Into<String>, timeout: StdDuration) -> Self {
        Self {
            client: http::client(timeout),
            api_key: api_key.into(),
            base_url: ECOS_BASE_URL.to_string(),
            rate_limiter: http::rate_limiter(60),
        }
    }

    /// Rows of one statistic item between two period labels, oldest first
    #[instrument(skip(self), fields(adapter = ADAPTER))]
    pub async fn get_stat_data(
        &self,
        stat_code: &str,
        item_code: &str,
        period: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<EcosRow>, SourceError> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/{}/json/kr/1/100/{stat_code}/{period}/{start}/{end}/{item_code}",
            self.base_url, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::fetch(
                ADAPTER,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, e))?;

        parse_rows(&body)
    }

    /// Latest reading of a configured statistic, with change versus the prior row
    pub async fn latest(
        &self,
        stat: &StatCode,
        as_of: NaiveDate,
    ) -> Result<Option<IndicatorReading>, SourceError> {
        let start = as_of - Duration::days(i64::from(stat.days_back));
        let rows = self
            .get_stat_data(
                &stat.stat_code,
                &stat.item_code,
                &stat.period,
                &period_label(&stat.period, start),
                &period_label(&stat.period, as_of),
            )
            .await?;

        Ok(latest_reading(stat, &rows))
    }
}

fn parse_rows(body: &str) -> Result<Vec<EcosRow>, SourceError> {
    let response: EcosResponse =
        serde_json::from_str(body).map_err(|e| SourceError::parse(ADAPTER, e))?;

    if let Some(search) = response.statistic_search {
        return Ok(search.row);
    }

    match response.result {
        Some(result) if result.code == NO_DATA_CODE => Ok(Vec::new()),
        Some(result) => Err(SourceError::fetch(
            ADAPTER,
            format!("{}: {}", result.code, result.message),
        )),
        None => Err(SourceError::parse(ADAPTER, "response has neither rows nor a result code")),
    }
}

/// Reduce rows to the latest numeric value and its change
fn latest_reading(stat: &StatCode, rows: &[EcosRow]) -> Option<IndicatorReading> {
    let mut values: Vec<(&str, f64)> = rows
        .iter()
        .filter_map(|row| {
            let value = row.value.trim().replace(',', "").parse::<f64>().ok()?;
            Some((row.time.as_str(), value))
        })
        .collect();
    values.sort_by(|a, b| a.0.cmp(b.0));

    let (period, value) = *values.last()?;
    let change = values
        .len()
        .checked_sub(2)
        .map(|i| value - values[i].1);

    Some(IndicatorReading {
        name: stat.name.clone(),
        source: ADAPTER.to_string(),
        period: period.to_string(),
        value,
        change,
        unit: stat.unit.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_krw() -> StatCode {
        StatCode {
            name: "USD/KRW".to_string(),
            stat_code: "731Y003".to_string(),
            item_code: "0000001".to_string(),
            period: "D".to_string(),
            days_back: 7,
            unit: "KRW".to_string(),
        }
    }

    #[test]
    fn test_period_label() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();
        assert_eq!(period_label("D", date), "20240509");
        assert_eq!(period_label("M", date), "202405");
        assert_eq!(period_label("Q", date), "2024Q2");
        assert_eq!(period_label("A", date), "2024");
    }

    #[test]
    fn test_parse_rows_and_latest() {
        let body = r#"{"StatisticSearch": {"list_total_count": 3, "row": [
            {"STAT_CODE": "731Y003", "TIME": "20240103", "DATA_VALUE": "1310.5"},
            {"STAT_CODE": "731Y003", "TIME": "20240102", "DATA_VALUE": "1300.0"},
            {"STAT_CODE": "731Y003", "TIME": "20240104", "DATA_VALUE": ""}
        ]}}"#;
        let rows = parse_rows(body).unwrap();
        assert_eq!(rows.len(), 3);

        let reading = latest_reading(&usd_krw(), &rows).unwrap();
        assert_eq!(reading.period, "20240103");
        assert!((reading.value - 1310.5).abs() < 1e-9);
        assert!((reading.change.unwrap() - 10.5).abs() < 1e-9);
        assert_eq!(reading.source, "ECOS");
    }

    #[test]
    fn test_single_row_has_no_change() {
        let rows = vec![EcosRow {
            time: "20240102".to_string(),
            value: "3.50".to_string(),
        }];
        let reading = latest_reading(&usd_krw(), &rows).unwrap();
        assert_eq!(reading.change, None);
        assert!(latest_reading(&usd_krw(), &[]).is_none());
    }

    #[test]
    fn test_result_codes() {
        let no_data = r#"{"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}}"#;
        assert!(parse_rows(no_data).unwrap().is_empty());

        let bad_key = r#"{"RESULT": {"CODE": "INFO-100", "MESSAGE": "인증키가 유효하지 않습니다."}}"#;
        assert!(matches!(parse_rows(bad_key), Err(SourceError::Fetch { .. })));
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_live_exchange_rate() {
        let key = std::env::var("ECOS_API_KEY").unwrap();
        let client = EcosClient::new(key, StdDuration::from_secs(10));
        let today = chrono::Local::now().date_naive();
        let reading = client.latest(&usd_krw(), today).await.unwrap();
        assert!(reading.is_some());
    }
}
