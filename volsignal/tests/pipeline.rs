mod fixtures;

use volsignal::market_data::{InMemoryProvider, PriceBar, PriceSeries, ProviderError};
use volsignal::models::{Bias, HorizonMethod, ModelKind};
use volsignal::util::AnalysisSettings;
use volsignal::{AnalysisError, Analyzer, ErrorKind};

fn analyzer(provider: InMemoryProvider) -> Analyzer<InMemoryProvider> {
    Analyzer::new(provider, AnalysisSettings::default())
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn steady_uptrend_is_bullish() {
    // 300 days rising 0.1% a day with small volatility clustering on top
    let provider =
        InMemoryProvider::new().with_series("UP", fixtures::garch_prices(300, 0.1, 0.1, 42));

    let result = analyzer(provider).analyze("UP").await.unwrap();

    assert_eq!(result.bias.bias, Bias::Bullish);
    assert!(result.bias.short_sma > result.bias.long_sma);
    assert!(result.volatility.one_day() > 0.0);
    // 1 - Phi(2 / sigma) stays below a coin flip
    assert!(result.probability_success >= 0.0);
    assert!(result.probability_success < 50.0);
    assert!(result.signal_strength >= 0.0);
    assert_eq!(result.model, ModelKind::Garch);
}

#[tokio::test]
async fn steady_downtrend_is_bearish() {
    let provider =
        InMemoryProvider::new().with_series("DOWN", fixtures::garch_prices(300, -0.2, 0.1, 7));

    let result = analyzer(provider).analyze("DOWN").await.unwrap();

    assert_eq!(result.bias.bias, Bias::Bearish);
    assert!(result.bias.short_sma < result.bias.long_sma);
}

#[tokio::test]
async fn result_fields_are_consistent() {
    let provider =
        InMemoryProvider::new().with_series("SPY", fixtures::garch_prices(250, 0.05, 1.2, 3));

    let result = analyzer(provider).analyze("SPY").await.unwrap();
    let sigma = result.volatility.one_day();

    assert!((result.range.lower - result.price * (1.0 - sigma / 100.0)).abs() < 1e-9);
    assert!((result.range.upper - result.price * (1.0 + sigma / 100.0)).abs() < 1e-9);
    assert!(!result.outside_range);
    assert!(result.probability_success > 0.0 && result.probability_success < 50.0);
    assert!(
        (result.signal_strength - result.probability_success / 100.0 * sigma).abs() < 1e-9
    );
    assert_eq!(result.horizon_ranges, vec![result.range]);
}

#[tokio::test]
async fn short_history_is_insufficient() {
    let provider =
        InMemoryProvider::new().with_series("NEW", fixtures::garch_prices(45, 0.1, 1.0, 5));

    let err = analyzer(provider).analyze("NEW").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[tokio::test]
async fn unknown_symbol_is_unavailable() {
    let err = analyzer(InMemoryProvider::new())
        .analyze("ZZZZ")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DataUnavailable { ref symbol, source: ProviderError::NotFound(_) } if symbol == "ZZZZ"
    ));
}

#[tokio::test]
async fn empty_history_is_unavailable() {
    let provider = InMemoryProvider::new().with_series("GONE", PriceSeries::default());
    let err = analyzer(provider).analyze("GONE").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
}

#[tokio::test]
async fn missing_quote_is_unavailable() {
    let provider = InMemoryProvider::new()
        .with_series("HALT", fixtures::garch_prices(300, 0.05, 1.0, 8))
        .without_quote("HALT");

    let err = analyzer(provider).analyze("HALT").await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DataUnavailable { ref symbol, source: ProviderError::NotFound(_) } if symbol == "HALT"
    ));
}

#[tokio::test]
async fn recent_gap_fails_instead_of_turning_neutral() {
    let clean = fixtures::garch_prices(300, -0.05, 1.0, 12);
    let mut bars = clean.bars().to_vec();
    let n = bars.len();
    bars[n - 5] = PriceBar::new(bars[n - 5].date, f64::NAN);

    let provider = InMemoryProvider::new()
        .with_series("GOOD", clean)
        .with_series("BAD", PriceSeries::new(bars));
    let report = analyzer(provider)
        .analyze_many(&symbols(&["BAD", "GOOD"]))
        .await;

    let ranked: Vec<&str> = report.ranked.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(ranked, vec!["GOOD"]);
    assert!(report.ranked[0].bias.short_sma.is_finite());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].symbol, "BAD");
    assert_eq!(report.failures[0].error.kind(), ErrorKind::InsufficientData);
}

#[tokio::test]
async fn flat_prices_fail_to_fit() {
    let provider = InMemoryProvider::new().with_series("PEG", fixtures::constant_prices(120, 1.0));
    let err = analyzer(provider).analyze("PEG").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelFit);
}

#[tokio::test]
async fn egarch_with_multi_day_horizon() {
    let provider =
        InMemoryProvider::new().with_series("TSLA", fixtures::garch_prices(365, 0.0, 2.5, 9));
    let settings = AnalysisSettings {
        model: ModelKind::Egarch,
        horizon_days: 3,
        ..AnalysisSettings::default()
    };

    let result = Analyzer::new(provider, settings).analyze("TSLA").await.unwrap();

    assert_eq!(result.model, ModelKind::Egarch);
    assert_eq!(result.volatility.horizon(), 3);
    assert_eq!(result.horizon_ranges.len(), 3);
    assert!(result.volatility.steps().iter().all(|s| *s >= 0.0));
    assert_eq!(result.range, result.horizon_ranges[0]);
}

#[tokio::test]
async fn refit_roll_matches_horizon() {
    let provider =
        InMemoryProvider::new().with_series("QQQ", fixtures::garch_prices(300, 0.05, 1.5, 15));
    let settings = AnalysisSettings {
        horizon_days: 2,
        horizon_method: HorizonMethod::Refit,
        ..AnalysisSettings::default()
    };

    let result = Analyzer::new(provider, settings).analyze("QQQ").await.unwrap();
    assert_eq!(result.volatility.horizon(), 2);
}

fn batch_provider() -> InMemoryProvider {
    InMemoryProvider::new()
        .with_series("AAA", fixtures::garch_prices(300, 0.1, 0.8, 101))
        .with_series("BBB", fixtures::garch_prices(300, -0.1, 2.0, 202))
        .with_series("CCC", fixtures::garch_prices(300, 0.05, 3.0, 303))
        .with_series("TINY", fixtures::garch_prices(20, 0.1, 1.0, 404))
}

#[tokio::test]
async fn batch_survives_failures() {
    let analyzer = analyzer(batch_provider()).with_max_concurrency(2);

    let report = analyzer
        .analyze_many(&symbols(&["AAA", "ZZZZ", "BBB", "TINY", "CCC"]))
        .await;

    let ranked: Vec<&str> = report.ranked.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(ranked.len(), 3);
    for symbol in ["AAA", "BBB", "CCC"] {
        assert!(ranked.contains(&symbol));
    }
    for pair in report.ranked.windows(2) {
        assert!(pair[0].signal_strength >= pair[1].signal_strength);
    }

    let failed: Vec<(&str, ErrorKind)> = report
        .failures
        .iter()
        .map(|f| (f.symbol.as_str(), f.error.kind()))
        .collect();
    assert_eq!(
        failed,
        vec![
            ("ZZZZ", ErrorKind::DataUnavailable),
            ("TINY", ErrorKind::InsufficientData)
        ]
    );
}

#[tokio::test]
async fn batch_ranking_is_reproducible() {
    let analyzer = analyzer(batch_provider());
    let list = symbols(&["CCC", "AAA", "BBB", "AAA"]);

    let first = analyzer.analyze_many(&list).await;
    let second = analyzer.analyze_many(&list).await;

    let order = |report: &volsignal::BatchReport| -> Vec<(String, f64)> {
        report
            .ranked
            .iter()
            .map(|r| (r.symbol.clone(), r.signal_strength))
            .collect()
    };
    assert_eq!(first.ranked.len(), 3, "duplicates are analysed once");
    assert_eq!(order(&first), order(&second));
    assert!(first.failures.is_empty());
}
