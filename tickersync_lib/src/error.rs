//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;
use crate::csv_sink::CsvSinkError;
use crate::warehouse::WarehouseError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding configuration, sink, and input validation failures.
#[derive(Debug)]
pub enum TickerSyncError {
    /// An error from the underlying API client.
    Api(tickers_api::Error),
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// Writing the delimited file failed.
    Csv(CsvSinkError),
    /// Loading into the warehouse failed.
    Warehouse(WarehouseError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for TickerSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::Warehouse(e) => write!(f, "Warehouse error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for TickerSyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Warehouse(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<tickers_api::Error> for TickerSyncError {
    fn from(e: tickers_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<ConfigError> for TickerSyncError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CsvSinkError> for TickerSyncError {
    fn from(e: CsvSinkError) -> Self {
        Self::Csv(e)
    }
}

impl From<WarehouseError> for TickerSyncError {
    fn from(e: WarehouseError) -> Self {
        Self::Warehouse(e)
    }
}
