use chrono::NaiveDate;
use serde::Deserialize;

pub const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// One daily observation: the trading date and its (adjusted) close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PriceBar { date, close }
    }
}

/// Daily closes in chronological order, one bar per date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts the bars by date. When a date appears twice the later bar wins.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps the input order among equal dates
        bars.sort_by_key(|bar| bar.date);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        PriceSeries { bars: deduped }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|bar| bar.date >= start)
            .copied()
            .collect();
        PriceSeries { bars }
    }
}

// Yahoo chart API response shapes

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(rename = "regularMarketPrice")]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    pub adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// One row of a Yahoo-style CSV export. Only the date and closes are read.
#[derive(Debug, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Date", deserialize_with = "crate::market_data::helpers::deserialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "Close", deserialize_with = "crate::market_data::helpers::deserialize_optional_f64")]
    pub close: Option<f64>,
    #[serde(
        rename = "Adj Close",
        default,
        deserialize_with = "crate::market_data::helpers::deserialize_optional_f64"
    )]
    pub adj_close: Option<f64>,
}
