//! OpenDART disclosure adapter
//!
//! Uses the `list.json` endpoint of the Financial Supervisory Service's
//! electronic disclosure system and keeps filings of watch-list companies.
//!
//! API Key: Free registration at https://opendart.fss.or.kr/
//! Rate Limit: 20,000 requests per day

use crate::http::{self, SharedRateLimiter};
use async_trait::async_trait;
use briefing_core::config::WatchItem;
use briefing_core::{Disclosure, FetchWindow, Record, SourceAdapter, SourceError, SourceKey};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";
const ADAPTER: &str = "DART";
const PAGE_COUNT: u32 = 100;
/// Upper bound on pages walked per fetch
const MAX_PAGES: u32 = 20;

/// Status codes returned in the JSON body
mod status {
    pub const OK: &str = "000";
    pub const NO_DATA: &str = "013";
}

#[derive(Debug, Deserialize)]
struct DartListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    total_page: u32,
    #[serde(default)]
    list: Vec<DartListItem>,
}

#[derive(Debug, Deserialize)]
struct DartListItem {
    corp_name: String,
    #[serde(default)]
    stock_code: String,
    report_nm: String,
    rcept_no: String,
    rcept_dt: String,
    #[serde(default)]
    flr_nm: String,
}

impl From<DartListItem> for Disclosure {
    fn from(item: DartListItem) -> Self {
        Self {
            corp_name: item.corp_name.trim().to_string(),
            stock_code: item.stock_code.trim().to_string(),
            report_name: item.report_nm.trim().to_string(),
            receipt_no: item.rcept_no,
            receipt_date: item.rcept_dt,
            filer: item.flr_nm,
        }
    }
}

/// Disclosure adapter over OpenDART
pub struct DartAdapter {
    client: Client,
    api_key: Option<String>,
    /// Stock codes to keep; empty keeps every filing
    watch_codes: HashSet<String>,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl DartAdapter {
    pub fn new(api_key: Option<String>, watchlist: &[WatchItem], timeout: Duration) -> Self {
        let watch_codes = watchlist
            .iter()
            .map(|item| item.code.split('.').next().unwrap_or(&item.code).to_string())
            .collect();

        Self {
            client: http::client(timeout),
            api_key,
            watch_codes,
            base_url: DART_BASE_URL.to_string(),
            rate_limiter: http::rate_limiter(100),
        }
    }

    /// Filings received between `start` and `end` (inclusive), newest first
    #[instrument(skip(self), fields(adapter = ADAPTER))]
    pub async fn list_disclosures(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Disclosure>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::unavailable(ADAPTER, "DART_API_KEY is not set"))?;

        let mut disclosures = Vec::new();
        let mut page = 1;
        loop {
            let response = self.fetch_page(api_key, start, end, page).await?;
            let total_pages = response.total_page;
            disclosures.extend(
                response
                    .list
                    .into_iter()
                    .filter(|item| self.is_watched(&item.stock_code))
                    .map(Disclosure::from),
            );

            if page >= total_pages || page >= MAX_PAGES {
                if page < total_pages {
                    debug!("Stopping after {} of {} pages", page, total_pages);
                }
                break;
            }
            page += 1;
        }

        sort_newest_first(&mut disclosures);
        Ok(disclosures)
    }

    fn is_watched(&self, stock_code: &str) -> bool {
        self.watch_codes.is_empty() || self.watch_codes.contains(stock_code.trim())
    }

    async fn fetch_page(
        &self,
        api_key: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: u32,
    ) -> Result<DartListResponse, SourceError> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("crtfc_key", api_key.to_string()),
            ("bgn_de", start.format("%Y%m%d").to_string()),
            ("end_de", end.format("%Y%m%d").to_string()),
            ("page_no", page.to_string()),
            ("page_count", PAGE_COUNT.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/list.json", self.base_url))
            .query(&params)
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

        parse_list_response(&body)
    }
}

/// Parse one page; the "no data" status becomes an empty page
fn parse_list_response(body: &str) -> Result<DartListResponse, SourceError> {
    let response: DartListResponse =
        serde_json::from_str(body).map_err(|e| SourceError::parse(ADAPTER, e))?;

    match response.status.as_str() {
        status::OK => Ok(response),
        status::NO_DATA => Ok(DartListResponse {
            list: Vec::new(),
            total_page: 0,
            ..response
        }),
        code => Err(SourceError::fetch(
            ADAPTER,
            format!("status {code}: {}", response.message),
        )),
    }
}

fn sort_newest_first(disclosures: &mut [Disclosure]) {
    disclosures.sort_by(|a, b| {
        b.receipt_date
            .cmp(&a.receipt_date)
            .then_with(|| b.receipt_no.cmp(&a.receipt_no))
    });
}

#[async_trait]
impl SourceAdapter for DartAdapter {
    fn key(&self) -> SourceKey {
        SourceKey::Disclosures
    }

    fn name(&self) -> &'static str {
        ADAPTER
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn status_detail(&self) -> String {
        match &self.api_key {
            Some(_) if self.watch_codes.is_empty() => "ready (all listed companies)".to_string(),
            Some(_) => format!("ready ({} watch-list companies)", self.watch_codes.len()),
            None => "DART_API_KEY is not set".to_string(),
        }
    }

    fn placeholder(&self) -> String {
        if self.is_available() {
            "_Disclosure data could not be retrieved from DART._".to_string()
        } else {
            "_DART API key is not configured. Set DART_API_KEY to enable disclosures._".to_string()
        }
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Record>, SourceError> {
        let disclosures = self
            .list_disclosures(window.start_date(), window.end_date())
            .await?;
        Ok(disclosures.into_iter().map(Record::Disclosure).collect())
    }

    fn format_for_briefing(&self, records: &[Record], window: &FetchWindow) -> String {
        let disclosures: Vec<&Disclosure> = records
            .iter()
            .filter_map(|record| match record {
                Record::Disclosure(d) => Some(d),
                _ => None,
            })
            .collect();

        if disclosures.is_empty() {
            return "No disclosures were filed in this window.".to_string();
        }

        let mut lines: Vec<String> = disclosures
            .iter()
            .take(window.max_disclosures)
            .map(|d| format!("- **{}**: {} ({})", d.corp_name, d.report_name, d.display_date()))
            .collect();

        if disclosures.len() > window.max_disclosures {
            lines.push(format!(
                "\n... and {} more",
                disclosures.len() - window.max_disclosures
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_core::ReportVariant;

    const SAMPLE: &str = r#"{
        "status": "000",
        "message": "정상",
        "page_no": 1,
        "page_count": 100,
        "total_count": 3,
        "total_page": 1,
        "list": [
            {"corp_code": "00126380", "corp_name": "삼성전자", "stock_code": "005930", "corp_cls": "Y",
             "report_nm": "분기보고서 (2023.09)", "rcept_no": "20240102000100", "flr_nm": "삼성전자",
             "rcept_dt": "20240102", "rm": ""},
            {"corp_code": "00164779", "corp_name": "SK하이닉스", "stock_code": "000660",
             "corp_cls": "Y", "report_nm": "주요사항보고서", "rcept_no": "20240103000050",
             "flr_nm": "SK하이닉스",
             "rcept_dt": "20240103", "rm": ""},
            {"corp_code": "00999999", "corp_name": "Other Co", "stock_code": "123456",
             "corp_cls": "K", "report_nm": "기타", "rcept_no": "20240103000060",
             "flr_nm": "Other Co",
             "rcept_dt": "20240103", "rm": ""}
        ]
    }"#;

    fn adapter() -> DartAdapter {
        DartAdapter::new(
            Some("key".to_string()),
            &[WatchItem::new("005930", "Samsung"), WatchItem::new("000660.KS", "Hynix")],
            Duration::from_secs(5),
        )
    }

    fn window() -> FetchWindow {
        let settings = ReportVariant::PostClose.default_settings();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        FetchWindow::for_variant(&settings, as_of)
    }

    #[test]
    fn test_parse_and_filter() {
        let response = parse_list_response(SAMPLE).unwrap();
        let adapter = adapter();
        let mut disclosures: Vec<Disclosure> = response
            .list
            .into_iter()
            .filter(|item| adapter.is_watched(&item.stock_code))
            .map(Disclosure::from)
            .collect();
        sort_newest_first(&mut disclosures);

        assert_eq!(disclosures.len(), 2);
        assert_eq!(disclosures[0].corp_name, "SK하이닉스");
        assert_eq!(disclosures[1].receipt_date, "20240102");
    }

    #[test]
    fn test_no_data_status_is_empty() {
        let body = r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#;
        let response = parse_list_response(body).unwrap();
        assert!(response.list.is_empty());
        assert_eq!(response.total_page, 0);
    }

    #[test]
    fn test_error_status_is_fetch_error() {
        let body = r#"{"status": "020", "message": "요청 제한을 초과하였습니다."}"#;
        assert!(matches!(
            parse_list_response(body),
            Err(SourceError::Fetch { .. })
        ));
        assert!(matches!(
            parse_list_response("<html>"),
            Err(SourceError::Parse { .. })
        ));
    }

    #[test]
    fn test_format_limits_items() {
        let adapter = adapter();
        let mut window = window();
        window.max_disclosures = 1;
        let records: Vec<Record> = parse_list_response(SAMPLE)
            .unwrap()
            .list
            .into_iter()
            .map(|item| Record::Disclosure(item.into()))
            .collect();

        let text = adapter.format_for_briefing(&records, &window);
        assert!(text.starts_with("- **삼성전자**: 분기보고서 (2023.09) (2024-01-02)"));
        assert!(text.ends_with("... and 2 more"));
    }

    #[test]
    fn test_unavailable_without_key() {
        let adapter = DartAdapter::new(None, &[], Duration::from_secs(5));
        assert!(!adapter.is_available());
        assert!(adapter.placeholder().contains("DART_API_KEY"));
    }

    #[tokio::test]
    async fn test_fetch_without_key_is_unavailable() {
        let adapter = DartAdapter::new(None, &[], Duration::from_secs(5));
        let result = adapter.fetch(&window()).await;
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_live_disclosures() {
        let key = std::env::var("DART_API_KEY").unwrap();
        let adapter = DartAdapter::new(Some(key), &[], Duration::from_secs(10));
        let window = window();
        let result = adapter
            .list_disclosures(window.start_date(), window.end_date())
            .await;
        assert!(result.is_ok());
    }
}
