//! Order checkout and status workflow.

mod commands;
mod service;

pub use commands::{
    ADDRESS_MAX_LEN, ChangeStatus, Checkout, CheckoutItem, MESSAGE_MAX_LEN, QUANTITY_MAX,
    ValidatedCheckout,
};
pub use service::{LifecycleConfig, OrderLifecycle, StatusChange};

use common::{BranchId, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A field is malformed or missing. `field` uses the wire name.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The branch does not exist.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// A line item references an unknown product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
}

impl OrderError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            message: message.into(),
        }
    }
}
