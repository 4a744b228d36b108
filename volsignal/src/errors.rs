use std::fmt;

use thiserror::Error;

use crate::market_data::ProviderError;

/// Why a single symbol's analysis failed. Every variant is local to that symbol.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no data available for {symbol}: {source}")]
    DataUnavailable {
        symbol: String,
        #[source]
        source: ProviderError,
    },

    #[error("insufficient data for {what}: need {required}, have {available}")]
    InsufficientData {
        what: &'static str,
        required: usize,
        available: usize,
    },

    #[error("model fit failed: {0}")]
    ModelFit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DataUnavailable,
    InsufficientData,
    ModelFit,
}

impl AnalysisError {
    pub fn data_unavailable(symbol: &str, source: ProviderError) -> Self {
        AnalysisError::DataUnavailable {
            symbol: symbol.to_string(),
            source,
        }
    }

    pub fn insufficient(what: &'static str, required: usize, available: usize) -> Self {
        AnalysisError::InsufficientData {
            what,
            required,
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            AnalysisError::InsufficientData { .. } => ErrorKind::InsufficientData,
            AnalysisError::ModelFit(_) => ErrorKind::ModelFit,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::DataUnavailable => "DataUnavailable",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::ModelFit => "ModelFit",
        };
        write!(f, "{}", name)
    }
}
