use std::collections::HashSet;

use futures::stream::{self, StreamExt};

use crate::errors::AnalysisError;
use crate::market_data::{MarketDataProvider, ProviderError};
use crate::models::probability::{
    expected_range, is_outside_range, probability_of_success, signal_strength,
};
use crate::models::{
    build_returns, estimate_bias, forecast_volatility, HorizonMethod, ModelKind, ReturnSeries,
    SignalResult, VolatilityForecast, VolatilityModels,
};
use crate::util::AnalysisSettings;

/// A symbol whose analysis failed, and why.
#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Outcome of a batch scan: successes ranked by signal strength, failures in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub ranked: Vec<SignalResult>,
    pub failures: Vec<SymbolFailure>,
}

/// Runs the per-symbol pipeline: history and quote from the provider, returns,
/// trend bias, volatility fit and forecast, then probability and signal score.
pub struct Analyzer<P> {
    provider: P,
    settings: AnalysisSettings,
    max_concurrency: usize,
}

impl<P: MarketDataProvider> Analyzer<P> {
    pub fn new(provider: P, settings: AnalysisSettings) -> Self {
        Analyzer {
            provider,
            settings,
            max_concurrency: 8,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub async fn analyze(&self, symbol: &str) -> Result<SignalResult, AnalysisError> {
        let settings = &self.settings;

        log::debug!("[{}] Fetching {} days of history...", symbol, settings.lookback_days);
        let prices = self
            .provider
            .fetch_price_history(symbol, settings.lookback_days)
            .await
            .map_err(|e| AnalysisError::data_unavailable(symbol, e))?;
        if prices.is_empty() {
            return Err(AnalysisError::data_unavailable(
                symbol,
                ProviderError::Empty(symbol.to_string()),
            ));
        }

        let price = self
            .provider
            .fetch_current_quote(symbol)
            .await
            .map_err(|e| AnalysisError::data_unavailable(symbol, e))?;

        let returns = build_returns(&prices)?;
        let bias = estimate_bias(&prices.closes(), settings.short_window, settings.long_window)?;

        log::debug!(
            "[{}] Fitting {} to {} returns...",
            symbol,
            settings.model,
            returns.len()
        );
        let (kind, method, horizon) = (settings.model, settings.horizon_method, settings.horizon_days);
        let (model, volatility) = fit_off_thread(kind, method, returns, horizon).await?;
        log::debug!(
            "[{}] {} log-likelihood {:.3}, one-day volatility {:.3}%",
            symbol,
            model.kind(),
            model.log_likelihood(),
            volatility.one_day()
        );

        let sigma = volatility.one_day();
        let probability = probability_of_success(bias.bias, sigma, settings.target_move_pct);
        let range = expected_range(price, sigma);
        let horizon_ranges = volatility
            .steps()
            .iter()
            .map(|step| expected_range(price, *step))
            .collect();

        Ok(SignalResult {
            symbol: symbol.to_string(),
            price,
            bias,
            probability_success: probability * 100.0,
            signal_strength: signal_strength(probability, sigma),
            outside_range: is_outside_range(price, &range),
            range,
            horizon_ranges,
            volatility,
            model: kind,
        })
    }

    /// Analyses every symbol independently. Duplicate symbols are analysed once.
    /// One symbol failing never stops the others.
    pub async fn analyze_many(&self, symbols: &[String]) -> BatchReport {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = symbols
            .iter()
            .map(|s| s.as_str())
            .filter(|s| seen.insert(*s))
            .collect();

        log::info!("Analyzing {} symbols...", unique.len());

        let mut outcomes: Vec<(usize, &str, Result<SignalResult, AnalysisError>)> =
            stream::iter(unique.iter().copied().enumerate())
                .map(|(index, symbol)| async move { (index, symbol, self.analyze(symbol).await) })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut report = BatchReport::default();
        for (_, symbol, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    log::info!(
                        "[{}] {} | probability {:.2}% | volatility {:.2}% | strength {:.3}",
                        symbol,
                        result.bias.bias,
                        result.probability_success,
                        result.volatility.one_day(),
                        result.signal_strength
                    );
                    report.ranked.push(result);
                }
                Err(error) => {
                    log::warn!("[{}] Skipping ({}): {}", symbol, error.kind(), error);
                    report.failures.push(SymbolFailure {
                        symbol: symbol.to_string(),
                        error,
                    });
                }
            }
        }

        rank(&mut report.ranked);
        report
    }
}

/// Strongest signal first; ties are broken by symbol so the order is reproducible.
pub fn rank(results: &mut [SignalResult]) {
    results.sort_by(|a, b| {
        b.signal_strength
            .total_cmp(&a.signal_strength)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

async fn fit_off_thread(
    kind: ModelKind,
    method: HorizonMethod,
    returns: ReturnSeries,
    horizon: usize,
) -> Result<(VolatilityModels, VolatilityForecast), AnalysisError> {
    tokio::task::spawn_blocking(move || forecast_volatility(kind, method, &returns, horizon))
        .await
        .map_err(|e| AnalysisError::ModelFit(format!("fitting task failed: {}", e)))?
}
