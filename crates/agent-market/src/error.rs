//! Error types for market data operations

use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// No rows for the symbol in the requested window
    #[error("No data for {symbol} between {start} and {end}")]
    NotFound {
        symbol: String,
        start: String,
        end: String,
    },

    /// Invalid symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Date string not in YYYYMMDD form or range inverted
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Bars out of order or duplicated
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Upstream provider failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Indicator needs more rows or a sane period
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// Chart could not be written
    #[error("Chart error: {0}")]
    Chart(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<MarketError> for agent_core::Error {
    fn from(err: MarketError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

impl From<yahoo_finance_api::YahooError> for MarketError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        MarketError::Provider(err.to_string())
    }
}
