#![allow(dead_code)]

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use volsignal::market_data::{PriceBar, PriceSeries};

fn standard_normal(rng: &mut SmallRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Daily closes starting at 100 and compounding the given percentage returns.
pub fn prices_from_returns(returns: &[f64]) -> PriceSeries {
    let mut close = 100.0;
    let mut bars = vec![PriceBar::new(start_date(), close)];
    for (i, r) in returns.iter().enumerate() {
        close *= 1.0 + r / 100.0;
        bars.push(PriceBar::new(start_date() + Duration::days(i as i64 + 1), close));
    }
    PriceSeries::new(bars)
}

/// Percentage returns with a constant drift and GARCH(1,1) shocks whose
/// long-run standard deviation is `vol_pct`.
pub fn garch_returns(n: usize, drift_pct: f64, vol_pct: f64, seed: u64) -> Vec<f64> {
    let (alpha, beta) = (0.10, 0.85);
    let long_run = vol_pct * vol_pct;
    let omega = long_run * (1.0 - alpha - beta);

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut variance = long_run;
    let mut shock: f64 = 0.0;
    let mut returns = Vec::with_capacity(n);
    for t in 0..(n + 100) {
        variance = omega + alpha * shock * shock + beta * variance;
        shock = variance.sqrt() * standard_normal(&mut rng);
        if t >= 100 {
            returns.push(drift_pct + shock);
        }
    }
    returns
}

/// `days` closes (so `days - 1` returns) drifting `drift_pct` per day.
pub fn garch_prices(days: usize, drift_pct: f64, vol_pct: f64, seed: u64) -> PriceSeries {
    prices_from_returns(&garch_returns(days - 1, drift_pct, vol_pct, seed))
}

pub fn constant_prices(days: usize, close: f64) -> PriceSeries {
    PriceSeries::new(
        (0..days)
            .map(|i| PriceBar::new(start_date() + Duration::days(i as i64), close))
            .collect(),
    )
}
