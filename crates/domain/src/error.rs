//! Domain error types.

use common::AggregateId;
use order_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The request was rejected by the order rules.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An aggregate written moments ago could not be read back.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),
}

impl DomainError {
    /// Returns true for malformed or missing input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::Order(OrderError::Validation { .. })
                | DomainError::Store(StoreError::Validation { .. })
        )
    }

    /// Returns true when a referenced row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::Order(OrderError::BranchNotFound(_) | OrderError::ProductNotFound(_))
                | DomainError::AggregateNotFound(_)
        )
    }
}
