use crate::errors::AnalysisError;
use crate::market_data::PriceSeries;

/// Daily percentage returns, free of NaN and infinite entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Wraps already-computed percentage returns, dropping non-finite entries.
    pub fn from_values(values: Vec<f64>) -> Self {
        ReturnSeries {
            values: values.into_iter().filter(|r| r.is_finite()).collect(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Population variance around the sample mean.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / self.values.len() as f64
    }

    /// Same series with one more observation appended.
    pub fn with_appended(&self, value: f64) -> ReturnSeries {
        let mut values = self.values.clone();
        if value.is_finite() {
            values.push(value);
        }
        ReturnSeries { values }
    }
}

/// Percentage change between consecutive closes: `100 * (p[t] - p[t-1]) / p[t-1]`.
///
/// A row whose prior close is zero, negative or not finite (or whose own close
/// is not finite) has no defined return and is dropped rather than zero-filled.
pub fn build_returns(prices: &PriceSeries) -> Result<ReturnSeries, AnalysisError> {
    if prices.len() < 2 {
        return Err(AnalysisError::insufficient("return series", 2, prices.len()));
    }

    let values = prices
        .bars()
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (pair[0].close, pair[1].close);
            if !prev.is_finite() || prev <= 0.0 || !curr.is_finite() {
                return None;
            }
            Some(100.0 * (curr - prev) / prev)
        })
        .collect();

    Ok(ReturnSeries { values })
}
