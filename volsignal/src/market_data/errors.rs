use thiserror::Error;

/// Failure reported by a market data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("symbol {0} is unknown to the provider")]
    NotFound(String),

    #[error("provider returned no data for {0}")]
    Empty(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("received non-success status code: {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Transport(_) => true,
            ProviderError::Http { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<csv::Error> for ProviderError {
    fn from(err: csv::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}
