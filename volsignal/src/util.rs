use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{HorizonMethod, ModelKind};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub symbols: Vec<String>,
    pub max_concurrency: usize,
    pub log_path: String,
    pub log_level: String,
    pub analysis: AnalysisSettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisSettings {
    pub lookback_days: u32,
    pub short_window: usize,
    pub long_window: usize,
    pub target_move_pct: f64,
    pub horizon_days: usize,
    pub model: ModelKind,
    pub horizon_method: HorizonMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    pub source: DataSource,
    pub timeout_ms: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub csv_dir: String,
}

// Default scan list
const DEFAULT_SYMBOLS: [&str; 43] = [
    "AAPL", "TSLA", "AMD", "MSFT", "SPY", "QQQ", "NVDA", "AMZN", "NIO", "SOFI", "F", "PLTR",
    "LCID", "CHPT", "AMC", "PINS", "AA", "SNAP", "BB", "XLF", "IWM", "EEM", "ARKK", "SLV", "FXI",
    "BABA", "JD", "RIOT", "MARA", "T", "PBR", "TLT", "UNG", "GDX", "KRE", "XOP", "XLE", "SPXL",
    "SOXS", "UVXY", "LABU", "SQQQ", "NCLH",
];

impl Default for Settings {
    fn default() -> Self {
        Settings {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            max_concurrency: 8,
            log_path: "logs/scanner.log".to_string(),
            log_level: "info".to_string(),
            analysis: AnalysisSettings::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            lookback_days: 365,
            short_window: 20,
            long_window: 50,
            target_move_pct: 2.0,
            horizon_days: 1,
            model: ModelKind::Garch,
            horizon_method: HorizonMethod::Recursive,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            source: DataSource::Yahoo,
            timeout_ms: 10_000,
            retries: 1,
            retry_delay_ms: 250,
            csv_dir: "data".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_concurrency == 0 {
            return Err(SettingsError::Invalid("maxConcurrency must be at least 1".into()));
        }
        self.analysis.validate()
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.lookback_days == 0 {
            return Err(SettingsError::Invalid("lookbackDays must be positive".into()));
        }
        if self.short_window == 0 || self.long_window == 0 {
            return Err(SettingsError::Invalid("moving average windows must be positive".into()));
        }
        if self.short_window >= self.long_window {
            return Err(SettingsError::Invalid(format!(
                "shortWindow ({}) must be smaller than longWindow ({})",
                self.short_window, self.long_window
            )));
        }
        if !self.target_move_pct.is_finite() || self.target_move_pct <= 0.0 {
            return Err(SettingsError::Invalid("targetMovePct must be a positive number".into()));
        }
        if self.horizon_days == 0 {
            return Err(SettingsError::Invalid("horizonDays must be at least 1".into()));
        }
        Ok(())
    }
}

pub fn parse_settings(json: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = serde_json::from_str(json)?;
    settings.validate()?;
    Ok(settings)
}

pub fn read_settings(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let settings = std::fs::read_to_string(path)?;
    parse_settings(&settings)
}
