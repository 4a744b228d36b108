use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as CalendarDuration;
use tokio::time::{sleep, timeout};

use crate::market_data::errors::ProviderError;
use crate::market_data::objects::PriceSeries;

/// Source of daily price history and current quotes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes covering the last `lookback_days` calendar days.
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError>;

    /// Latest traded price.
    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError>;
}

#[async_trait]
impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError> {
        (**self).fetch_price_history(symbol, lookback_days).await
    }

    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError> {
        (**self).fetch_current_quote(symbol).await
    }
}

/// Wraps a provider with a per-call timeout and a bounded retry on transient failures.
pub struct RetryingProvider<P> {
    inner: P,
    timeout_ms: u64,
    retries: u32,
    retry_delay_ms: u64,
}

impl<P: MarketDataProvider> RetryingProvider<P> {
    pub fn new(inner: P, timeout_ms: u64, retries: u32, retry_delay_ms: u64) -> Self {
        RetryingProvider {
            inner,
            timeout_ms,
            retries,
            retry_delay_ms,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, symbol: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ProviderError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let result = match timeout(Duration::from_millis(self.timeout_ms), call()).await {
                Ok(result) => result,
                Err(_elapsed) => Err(ProviderError::Timeout(self.timeout_ms)),
            };

            match result {
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    log::warn!(
                        "[{}] Transient provider failure ({}), retry {}/{}...",
                        symbol,
                        err,
                        attempt,
                        self.retries
                    );
                    sleep(Duration::from_millis(self.retry_delay_ms)).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for RetryingProvider<P> {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError> {
        self.with_retry(symbol, || self.inner.fetch_price_history(symbol, lookback_days))
            .await
    }

    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError> {
        self.with_retry(symbol, || self.inner.fetch_current_quote(symbol))
            .await
    }
}

/// Frozen in-memory data, keyed by symbol. The lookback window is measured
/// back from each series' latest bar.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, PriceSeries>,
    quotes: HashMap<String, f64>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        InMemoryProvider::default()
    }

    /// Registers a series; the quote defaults to the last close.
    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        if let Some(last) = series.last() {
            self.quotes.insert(symbol.to_string(), last.close);
        }
        self.series.insert(symbol.to_string(), series);
        self
    }

    pub fn with_quote(mut self, symbol: &str, price: f64) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    /// Keeps the history but makes quote requests for `symbol` fail.
    pub fn without_quote(mut self, symbol: &str) -> Self {
        self.quotes.remove(symbol);
        self
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError> {
        let series = self
            .series
            .get(symbol)
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;
        let last = series
            .last()
            .ok_or_else(|| ProviderError::Empty(symbol.to_string()))?;

        let start = last.date - CalendarDuration::days(i64::from(lookback_days));
        Ok(series.since(start))
    }

    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError> {
        self.quotes
            .get(symbol)
            .copied()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }
}
