use std::fmt::Write;

use volsignal::models::{Bias, SignalResult};
use volsignal::BatchReport;

const HEADER: &str = "Symbol     Price   Strength  Prob %   Vol %  Expected range";

fn row(result: &SignalResult) -> String {
    // ** marks a price already outside its expected one-day range
    let marker = if result.outside_range { "**" } else { "" };
    format!(
        "{:<8} {:>9} {:>8.3} {:>7.2} {:>7.2}  {:.2} - {:.2}",
        result.symbol,
        format!("{}{:.2}", marker, result.price),
        result.signal_strength,
        result.probability_success,
        result.volatility.one_day(),
        result.range.lower,
        result.range.upper
    )
}

/// Renders the ranked results grouped by bias, followed by any failures.
/// Rows keep the report's ranking order inside each table.
pub fn render(report: &BatchReport) -> String {
    let mut out = String::new();

    for bias in [Bias::Bullish, Bias::Bearish, Bias::Neutral] {
        let rows: Vec<&SignalResult> = report
            .ranked
            .iter()
            .filter(|r| r.direction() == bias)
            .collect();
        if rows.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n{} ({})", bias, rows.len());
        let _ = writeln!(out, "{}", HEADER);
        for result in rows {
            let _ = writeln!(out, "{}", row(result));
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nFailed ({})", report.failures.len());
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "{:<8} [{}] {}",
                failure.symbol,
                failure.error.kind(),
                failure.error
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use volsignal::models::{BiasResult, ModelKind, PriceRange, VolatilityForecast};
    use volsignal::{AnalysisError, SymbolFailure};

    fn result(symbol: &str, bias: Bias, strength: f64, outside_range: bool) -> SignalResult {
        SignalResult {
            symbol: symbol.to_string(),
            price: 100.0,
            bias: BiasResult {
                bias,
                short_sma: 100.0,
                long_sma: 100.0,
            },
            probability_success: 10.0,
            volatility: VolatilityForecast::from_variances(&[4.0]),
            signal_strength: strength,
            range: PriceRange {
                lower: 98.0,
                upper: 102.0,
            },
            horizon_ranges: Vec::new(),
            outside_range,
            model: ModelKind::Garch,
        }
    }

    #[test]
    fn groups_by_bias_and_lists_failures() {
        let report = BatchReport {
            ranked: vec![
                result("TSLA", Bias::Bearish, 0.9, false),
                result("AAPL", Bias::Bullish, 0.5, true),
                result("SPY", Bias::Bullish, 0.1, false),
            ],
            failures: vec![SymbolFailure {
                symbol: "ZZZZ".to_string(),
                error: AnalysisError::insufficient("trend estimate", 50, 12),
            }],
        };

        let text = render(&report);

        let bullish = text.find("Bullish (2)").unwrap();
        let bearish = text.find("Bearish (1)").unwrap();
        assert!(bullish < bearish);
        assert!(text.find("AAPL").unwrap() < text.find("SPY").unwrap());
        assert!(text.contains("**100.00"));
        assert!(!text.contains("Neutral"));
        assert!(text.contains("ZZZZ     [InsufficientData]"));
    }
}
