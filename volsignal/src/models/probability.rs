use statrs::distribution::{ContinuousCDF, Normal};

use crate::models::trading_signal::PriceRange;
use crate::models::trend::Bias;

fn standard_normal_cdf(z: f64) -> f64 {
    // Infinite z saturates the CDF to 0 or 1
    if z == f64::INFINITY {
        return 1.0;
    }
    if z == f64::NEG_INFINITY {
        return 0.0;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => 0.5,
    }
}

/// Probability (0 to 1) that the next daily return reaches `target_move_pct`
/// in the direction of `bias`, with returns modelled as N(0, volatility_pct).
///
/// Neutral bias is a coin flip. A zero volatility can never produce the move,
/// so any directional probability is 0.
pub fn probability_of_success(bias: Bias, volatility_pct: f64, target_move_pct: f64) -> f64 {
    if bias == Bias::Neutral {
        return 0.5;
    }
    if volatility_pct.is_nan() || volatility_pct <= 0.0 {
        return 0.0;
    }

    // (P * (1 + m/100) - P) / (P * s/100) reduces to m / s
    // 1 - Phi(z) == Phi(-z), and the lower tail keeps its precision for large z
    let z = target_move_pct / volatility_pct;
    standard_normal_cdf(-z)
}

/// One standard deviation either side of `price`.
pub fn expected_range(price: f64, volatility_pct: f64) -> PriceRange {
    PriceRange {
        lower: price * (1.0 - volatility_pct / 100.0),
        upper: price * (1.0 + volatility_pct / 100.0),
    }
}

/// Ranking score: probability as a fraction times volatility in percent.
pub fn signal_strength(probability: f64, volatility_pct: f64) -> f64 {
    probability * volatility_pct
}

pub fn is_outside_range(price: f64, range: &PriceRange) -> bool {
    !(range.lower <= price && price <= range.upper)
}
