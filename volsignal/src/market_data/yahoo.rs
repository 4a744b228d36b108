use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue};

use crate::market_data::errors::ProviderError;
use crate::market_data::helpers::date_from_unix;
use crate::market_data::objects::{ChartData, ChartResponse, PriceBar, PriceSeries, CHART_URL};
use crate::market_data::provider::MarketDataProvider;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Daily history and quotes from the Yahoo Finance chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(YahooProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_chart(&self, symbol: &str, query: &str) -> Result<ChartData, ProviderError> {
        let url = format!("{}/{}?{}", self.base_url, symbol, query);
        log::trace!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_chart(symbol, &body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(lookback_days));
        let query = format!(
            "period1={}&period2={}&interval=1d&includeAdjustedClose=true",
            start.timestamp(),
            end.timestamp()
        );

        let chart = self.get_chart(symbol, &query).await?;
        let series = history_from_chart(&chart);
        if series.is_empty() {
            return Err(ProviderError::Empty(symbol.to_string()));
        }

        log::debug!(
            "[{}] Received {} daily bars from Yahoo.",
            symbol,
            series.len()
        );
        Ok(series)
    }

    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError> {
        let chart = self.get_chart(symbol, "range=1d&interval=1d").await?;

        quote_from_chart(&chart).ok_or_else(|| ProviderError::Empty(symbol.to_string()))
    }
}

fn parse_chart(symbol: &str, body: &str) -> Result<ChartData, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("Error parsing JSON: {}", e)))?;

    if let Some(error) = response.chart.error {
        log::debug!("[{}] Yahoo error {}: {}", symbol, error.code, error.description);
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        return Err(ProviderError::Malformed(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::Empty(symbol.to_string()))
}

/// Uses the adjusted close column when Yahoo sends one and the raw closes only
/// when it does not. Rows without a usable close in the chosen column are
/// skipped, never filled from the other column.
fn history_from_chart(chart: &ChartData) -> PriceSeries {
    let adjusted = chart
        .indicators
        .adjclose
        .as_ref()
        .and_then(|columns| columns.first())
        .map(|column| &column.adjclose)
        .filter(|column| !column.is_empty());
    let raw = chart.indicators.quote.first().map(|column| &column.close);

    let Some(closes) = adjusted.or(raw) else {
        return PriceSeries::default();
    };

    let bars = chart
        .timestamp
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let close = (*close).filter(|c| c.is_finite())?;
            let date = date_from_unix(*ts)?;
            Some(PriceBar::new(date, close))
        })
        .collect();

    PriceSeries::new(bars)
}

/// `regularMarketPrice` when present, otherwise the latest close.
fn quote_from_chart(chart: &ChartData) -> Option<f64> {
    chart
        .meta
        .regular_market_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .or_else(|| history_from_chart(chart).last().map(|bar| bar.close))
}
