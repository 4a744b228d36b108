pub mod optimization;
pub mod probability;
pub mod returns;
pub mod trading_signal;
pub mod trend;
pub mod volatility;

pub use returns::*;
pub use trading_signal::*;
pub use trend::*;
pub use volatility::*;
