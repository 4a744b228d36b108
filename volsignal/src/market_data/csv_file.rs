use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Duration;

use crate::market_data::errors::ProviderError;
use crate::market_data::objects::{CsvRow, PriceBar, PriceSeries};
use crate::market_data::provider::MarketDataProvider;

/// Reads `<dir>/<SYMBOL>.csv` files in the Yahoo export layout
/// (`Date,Open,High,Low,Close,Adj Close,Volume`). The quote is the last close,
/// and the lookback window is measured back from the latest row.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvProvider { dir: dir.into() }
    }

    // Symbols name files directly inside `dir`, never a path
    fn path_for(&self, symbol: &str) -> Option<PathBuf> {
        let plain = !symbol.is_empty()
            && symbol != "."
            && symbol != ".."
            && !symbol.contains(|c: char| c == '/' || c == '\\' || c == '\0');
        plain.then(|| self.dir.join(format!("{}.csv", symbol)))
    }

    async fn load(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let path = self
            .path_for(symbol)
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        let name = symbol.to_string();
        let series = tokio::task::spawn_blocking(move || {
            if !path.is_file() {
                return Err(ProviderError::NotFound(name));
            }
            read_series(&path)
        })
        .await
        .map_err(|e| ProviderError::Malformed(format!("csv reader task failed: {}", e)))??;

        if series.is_empty() {
            return Err(ProviderError::Empty(symbol.to_string()));
        }
        Ok(series)
    }
}

fn read_series(path: &Path) -> Result<PriceSeries, ProviderError> {
    let mut reader = csv::Reader::from_path(path)?;
    // Adjusted closes when the export has them, raw closes only when it has none
    let adjusted = reader.headers()?.iter().any(|h| h.trim() == "Adj Close");

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        let close = if adjusted { row.adj_close } else { row.close };
        if let Some(close) = close.filter(|c| c.is_finite()) {
            bars.push(PriceBar::new(row.date, close));
        }
    }

    Ok(PriceSeries::new(bars))
}

#[async_trait]
impl MarketDataProvider for CsvProvider {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ProviderError> {
        let series = self.load(symbol).await?;
        let last = series
            .last()
            .ok_or_else(|| ProviderError::Empty(symbol.to_string()))?;
        let start = last.date - Duration::days(i64::from(lookback_days));
        Ok(series.since(start))
    }

    async fn fetch_current_quote(&self, symbol: &str) -> Result<f64, ProviderError> {
        let series = self.load(symbol).await?;
        series
            .last()
            .map(|bar| bar.close)
            .ok_or_else(|| ProviderError::Empty(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("volsignal-csv-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_yahoo_export() {
        let dir = scratch_dir("export");
        std::fs::write(
            dir.join("SPY.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,470.0,471.0,466.0,468.8,467.0,100\n\
             2024-01-02,472.0,473.0,470.0,472.6,470.1,100\n\
             2024-01-04,468.0,469.0,465.0,467.3,null,100\n",
        )
        .unwrap();

        let provider = CsvProvider::new(&dir);
        let series = provider.fetch_price_history("SPY", 365).await.unwrap();
        // 2024-01-04 has no adjusted close and is left out
        assert_eq!(series.closes(), vec![470.1, 467.0]);
        assert_eq!(provider.fetch_current_quote("SPY").await.unwrap(), 467.0);

        let recent = provider.fetch_price_history("SPY", 0).await.unwrap();
        assert_eq!(recent.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn adjusted_gaps_are_not_filled_from_raw_closes() {
        let dir = scratch_dir("split");
        std::fs::write(
            dir.join("AAPL.csv"),
            "Date,Close,Adj Close\n\
             2024-01-02,100,50\n\
             2024-01-03,101,\n\
             2024-01-04,102,NaN\n\
             2024-01-05,103,51\n",
        )
        .unwrap();

        let series = CsvProvider::new(&dir)
            .fetch_price_history("AAPL", 365)
            .await
            .unwrap();
        assert_eq!(series.closes(), vec![50.0, 51.0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn raw_closes_without_adjusted_column() {
        let dir = scratch_dir("raw");
        std::fs::write(
            dir.join("EURUSD.csv"),
            "Date,Close\n2024-01-02,1.10\n2024-01-03,\n2024-01-04,1.12\n",
        )
        .unwrap();

        let series = CsvProvider::new(&dir)
            .fetch_price_history("EURUSD", 365)
            .await
            .unwrap();
        assert_eq!(series.closes(), vec![1.10, 1.12]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn symbols_cannot_escape_the_directory() {
        let dir = scratch_dir("escape");
        std::fs::write(dir.join("SECRET.csv"), "Date,Close\n2024-01-02,1.0\n").unwrap();
        let provider = CsvProvider::new(dir.join("inner"));
        std::fs::create_dir_all(dir.join("inner")).unwrap();

        for symbol in ["../SECRET", "..", "", "a/b", "a\\b"] {
            let err = provider.fetch_price_history(symbol, 365).await.unwrap_err();
            assert!(matches!(err, ProviderError::NotFound(_)), "{:?}", symbol);
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let provider = CsvProvider::new(scratch_dir("missing"));
        let err = provider.fetch_current_quote("NOPE").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
