//! Volatility forecasting and directional signal ranking for options screening.
//!
//! Daily closes come from a [`market_data::MarketDataProvider`]. Each symbol's
//! returns are fitted with a GARCH(1,1) or EGARCH(1,1) model, the forecast
//! volatility is combined with a 20/50-day moving-average bias into a success
//! probability, and [`Analyzer::analyze_many`] ranks symbols by
//! probability x volatility.

pub mod analyzer;
pub mod errors;
pub mod logging;
pub mod market_data;
pub mod models;
pub mod util;

pub use analyzer::{rank, Analyzer, BatchReport, SymbolFailure};
pub use errors::{AnalysisError, ErrorKind};
