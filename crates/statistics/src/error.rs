//! Statistics error types.

use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur while computing a series.
#[derive(Debug, Error)]
pub enum StatisticsError {
    /// An error occurred in the order store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A query parameter is out of range. `field` uses the wire name.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A month boundary could not be represented.
    #[error("Invalid month window for {year}-{month:02}")]
    InvalidWindow { year: i32, month: u32 },
}

impl StatisticsError {
    /// Returns true for malformed query parameters.
    pub fn is_validation(&self) -> bool {
        matches!(self, StatisticsError::Validation { .. })
    }
}

/// Result type for statistics operations.
pub type Result<T> = std::result::Result<T, StatisticsError>;
