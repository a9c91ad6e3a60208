//! Federal Reserve Economic Data (FRED) client
//!
//! Supplies the comparison-economy readings shown next to the ECOS figures.
//!
//! API Key: Free registration at https://fred.stlouisfed.org/docs/api/api_key.html
//! Rate Limit: 120 requests per minute

use crate::http::{self, SharedRateLimiter};
use briefing_core::config::FredSeries;
use briefing_core::{IndicatorReading, SourceError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";
const ADAPTER: &str = "FRED";

/// Observation data from a FRED series
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    /// Date of observation (YYYY-MM-DD)
    pub date: String,
    /// Value ("." for missing data)
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

/// FRED API client
pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http::client(timeout),
            api_key: api_key.into(),
            base_url: FRED_BASE_URL.to_string(),
            rate_limiter: http::rate_limiter(120),
        }
    }

    /// Most recent observations of a series, newest first
    pub async fn get_observations(
        &self,
        series_id: &str,
        limit: u32,
    ) -> Result<Vec<Observation>, SourceError> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("series_id", series_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("file_type", "json".to_string()),
            ("sort_order", "desc".to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/series/observations", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::fetch(ADAPTER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::fetch(
                ADAPTER,
                format!("FRED API error: {}", response.status()),
            ));
        }

        let data: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::parse(ADAPTER, e))?;

        Ok(data.observations)
    }

    /// Latest value of a series with change versus the previous observation
    pub async fn latest(
        &self,
        series: &FredSeries,
    ) -> Result<Option<IndicatorReading>, SourceError> {
        // A few extra rows so missing "." values still leave two numbers
        let observations = self.get_observations(&series.series_id, 5).await?;
        Ok(latest_reading(series, &observations))
    }
}

fn latest_reading(series: &FredSeries, observations: &[Observation]) -> Option<IndicatorReading> {
    let mut numeric = observations
        .iter()
        .filter_map(|o| o.value.parse::<f64>().ok().map(|v| (o.date.as_str(), v)));

    let (date, value) = numeric.next()?;
    let change = numeric.next().map(|(_, previous)| value - previous);

    Some(IndicatorReading {
        name: series.name.clone(),
        source: ADAPTER.to_string(),
        period: date.to_string(),
        value,
        change,
        unit: series.unit.clone(),
    })
}
