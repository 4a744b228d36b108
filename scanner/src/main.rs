mod report;

use std::env;
use std::path::Path;

use anyhow::{anyhow, Context};
use volsignal::logging::configure_logger;
use volsignal::market_data::{CsvProvider, MarketDataProvider, RetryingProvider, YahooProvider};
use volsignal::util::{read_settings, DataSource, ProviderSettings, Settings};
use volsignal::Analyzer;

const DEFAULT_SETTINGS: &str = "settings.json";

fn load_settings(path: &str) -> anyhow::Result<Settings> {
    if !Path::new(path).exists() {
        return Ok(Settings::default());
    }
    read_settings(path).with_context(|| format!("loading {}", path))
}

fn build_provider(settings: &ProviderSettings) -> anyhow::Result<Box<dyn MarketDataProvider>> {
    let provider: Box<dyn MarketDataProvider> = match settings.source {
        DataSource::Yahoo => Box::new(YahooProvider::new()?),
        DataSource::Csv => Box::new(CsvProvider::new(&settings.csv_dir)),
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // scanner [settings.json] [EXTRA_SYMBOL ...]
    let mut args = env::args().skip(1).peekable();
    let settings_path = match args.peek() {
        Some(arg) if arg.ends_with(".json") => args.next().unwrap_or_default(),
        _ => DEFAULT_SETTINGS.to_string(),
    };

    let mut settings = load_settings(&settings_path)?;
    for symbol in args {
        let symbol = symbol.to_uppercase();
        if !settings.symbols.contains(&symbol) {
            settings.symbols.push(symbol);
        }
    }

    configure_logger(&settings.log_path, &settings.log_level)
        .map_err(|e| anyhow!("failed to configure logging: {}", e))?;

    let provider = RetryingProvider::new(
        build_provider(&settings.provider)?,
        settings.provider.timeout_ms,
        settings.provider.retries,
        settings.provider.retry_delay_ms,
    );
    let analyzer = Analyzer::new(provider, settings.analysis.clone())
        .with_max_concurrency(settings.max_concurrency);

    log::info!(
        "Scanning {} symbols with {} ({}% move)...",
        settings.symbols.len(),
        settings.analysis.model,
        settings.analysis.target_move_pct
    );

    let report = tokio::select! {
        report = analyzer.analyze_many(&settings.symbols) => report,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, abandoning scan");
            return Ok(());
        }
    };

    print!("{}", report::render(&report));
    log::info!(
        "Done: {} ranked, {} failed",
        report.ranked.len(),
        report.failures.len()
    );

    Ok(())
}
