use serde::Serialize;

use crate::models::trend::{Bias, BiasResult};
use crate::models::volatility::{ModelKind, VolatilityForecast};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub lower: f64,
    pub upper: f64,
}

/// Outcome of analysing one symbol, handed to whatever ranks or displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalResult {
    pub symbol: String,
    pub price: f64,
    pub bias: BiasResult,
    pub probability_success: f64, // percent, 0 to 100
    pub volatility: VolatilityForecast,
    pub signal_strength: f64, // probability (fraction) x one-day volatility (percent)
    pub range: PriceRange,    // expected one-day range
    pub horizon_ranges: Vec<PriceRange>,
    pub outside_range: bool,
    pub model: ModelKind,
}

impl SignalResult {
    pub fn direction(&self) -> Bias {
        self.bias.bias
    }
}
