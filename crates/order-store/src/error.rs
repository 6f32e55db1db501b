use thiserror::Error;

use crate::AggregateId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No aggregate row matched the given id.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// A row failed validation before being written.
    #[error("Invalid {entity}: {reason}")]
    Validation {
        entity: &'static str,
        reason: String,
    },

    /// A stored value could not be mapped back into the domain.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn validation(entity: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            entity,
            reason: reason.into(),
        }
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
