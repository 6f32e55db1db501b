//! Order commands and their validation rules.

use common::{AggregateId, BranchId, OrderStatus, PaymentTypeId, ProductId, UserId};

use super::OrderError;

/// Longest accepted delivery address, in characters.
pub const ADDRESS_MAX_LEN: usize = 255;

/// Longest accepted free-text message, in characters.
pub const MESSAGE_MAX_LEN: usize = 2000;

/// Largest quantity a single line item may carry (a signed 32-bit column).
pub const QUANTITY_MAX: u32 = i32::MAX as u32;

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    /// Signed so that out-of-range input reaches validation instead of
    /// failing deserialization.
    pub quantity: i64,
}

impl CheckoutItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to turn the caller's selection into an order.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// The purchaser, as established by the authentication layer.
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub payment_type_id: PaymentTypeId,
    pub address: Option<String>,
    pub message: Option<String>,
    pub line_items: Vec<CheckoutItem>,
}

/// A checkout that passed shape validation.
///
/// `address` is present exactly when the payment type denotes delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub payment_type_id: PaymentTypeId,
    pub address: Option<String>,
    pub message: Option<String>,
    pub line_items: Vec<(ProductId, u32)>,
}

impl Checkout {
    /// Creates a checkout without address or message.
    pub fn new(
        user_id: UserId,
        branch_id: BranchId,
        payment_type_id: PaymentTypeId,
        line_items: Vec<CheckoutItem>,
    ) -> Self {
        Self {
            user_id,
            branch_id,
            payment_type_id,
            address: None,
            message: None,
            line_items,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Checks the request shape.
    ///
    /// The address is required when `payment_type_id == delivery` and
    /// discarded otherwise, even if supplied.
    pub fn validate(self, delivery: PaymentTypeId) -> Result<ValidatedCheckout, OrderError> {
        if !self.user_id.is_valid() {
            return Err(OrderError::validation("userId", "must be a positive id"));
        }
        if !self.branch_id.is_valid() {
            return Err(OrderError::validation("branchId", "must be a positive id"));
        }
        if !self.payment_type_id.is_valid() {
            return Err(OrderError::validation(
                "paymentTypeId",
                "must be a positive id",
            ));
        }

        let message = non_blank(self.message);
        if let Some(message) = &message
            && message.chars().count() > MESSAGE_MAX_LEN
        {
            return Err(OrderError::validation(
                "message",
                format!("must be at most {MESSAGE_MAX_LEN} characters"),
            ));
        }

        let address = non_blank(self.address);
        if let Some(address) = &address
            && address.chars().count() > ADDRESS_MAX_LEN
        {
            return Err(OrderError::validation(
                "address",
                format!("must be at most {ADDRESS_MAX_LEN} characters"),
            ));
        }
        let address = if self.payment_type_id == delivery {
            Some(address.ok_or_else(|| {
                OrderError::validation("address", "is required for delivery orders")
            })?)
        } else {
            None
        };

        if self.line_items.is_empty() {
            return Err(OrderError::validation("lineItems", "must not be empty"));
        }
        let line_items = self
            .line_items
            .into_iter()
            .map(|item| {
                if !item.product_id.is_valid() {
                    return Err(OrderError::validation(
                        "lineItems",
                        format!("product id {} is not positive", item.product_id),
                    ));
                }
                match u32::try_from(item.quantity) {
                    Ok(quantity) if (1..=QUANTITY_MAX).contains(&quantity) => {
                        Ok((item.product_id, quantity))
                    }
                    _ => Err(OrderError::validation(
                        "lineItems",
                        format!(
                            "quantity {} for product {} must be between 1 and {QUANTITY_MAX}",
                            item.quantity, item.product_id
                        ),
                    )),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedCheckout {
            user_id: self.user_id,
            branch_id: self.branch_id,
            payment_type_id: self.payment_type_id,
            address,
            message,
            line_items,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Command to move an aggregate to another status.
#[derive(Debug, Clone)]
pub struct ChangeStatus {
    pub aggregate_id: AggregateId,
    /// Raw label as received; parsed during validation.
    pub status: String,
}

impl ChangeStatus {
    pub fn new(aggregate_id: AggregateId, status: impl Into<String>) -> Self {
        Self {
            aggregate_id,
            status: status.into(),
        }
    }

    /// Accepts `processing`, `ready`, `in_transit` and `received`.
    pub fn validate(&self) -> Result<OrderStatus, OrderError> {
        if !self.aggregate_id.is_valid() {
            return Err(OrderError::validation("id", "must be a positive id"));
        }
        match self.status.parse::<OrderStatus>() {
            Ok(status) if status.is_change_target() => Ok(status),
            _ => Err(OrderError::validation(
                "status",
                format!(
                    "{:?} is not one of processing, ready, in_transit, received",
                    self.status
                ),
            )),
        }
    }
}
