use std::fmt;

use serde::Serialize;

use crate::errors::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
            Bias::Neutral => "Neutral",
        };
        write!(f, "{}", name)
    }
}

/// The direction call together with the moving averages behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiasResult {
    pub bias: Bias,
    pub short_sma: f64,
    pub long_sma: f64,
}

// Short average above the long one means the recent trend is up
pub fn classify(short_sma: f64, long_sma: f64) -> Bias {
    if short_sma > long_sma {
        Bias::Bullish
    } else if short_sma < long_sma {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Mean of the last `window` closes.
pub fn sma(closes: &[f64], window: usize) -> Result<f64, AnalysisError> {
    if window == 0 || closes.len() < window {
        return Err(AnalysisError::insufficient(
            "moving average",
            window.max(1),
            closes.len(),
        ));
    }
    let recent = &closes[closes.len() - window..];
    let usable = recent.iter().filter(|c| c.is_finite()).count();
    if usable < window {
        return Err(AnalysisError::insufficient("moving average", window, usable));
    }
    Ok(recent.iter().sum::<f64>() / window as f64)
}

/// Rolling SMA history, one value per complete window (oldest first).
pub fn sma_series(closes: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || closes.len() < window {
        return Vec::new();
    }

    let mut averages = Vec::with_capacity(closes.len() - window + 1);
    let mut sum: f64 = closes[..window].iter().sum();
    averages.push(sum / window as f64);
    for i in window..closes.len() {
        sum += closes[i] - closes[i - window];
        averages.push(sum / window as f64);
    }
    averages
}

/// Classifies the trend from the latest short and long simple moving averages.
/// Only the most recent window of each average takes part in the decision.
pub fn estimate_bias(
    closes: &[f64],
    short_window: usize,
    long_window: usize,
) -> Result<BiasResult, AnalysisError> {
    if closes.len() < long_window {
        return Err(AnalysisError::insufficient(
            "trend estimate",
            long_window,
            closes.len(),
        ));
    }

    let short_sma = sma(closes, short_window)?;
    let long_sma = sma(closes, long_window)?;

    Ok(BiasResult {
        bias: classify(short_sma, long_sma),
        short_sma,
        long_sma,
    })
}
