//! Rows owned by the order store and their hydrated read shapes.

use chrono::{DateTime, Utc};
use common::{Money, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::directory::{PaymentType, Product, Purchaser};
use crate::error::{Result, StoreError};
use crate::{AggregateId, BranchId, LineItemId, PaymentTypeId, ProductId, UserId};

/// A line item about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price per unit at the moment of checkout.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl NewLineItem {
    pub fn new(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            created_at,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.product_id.is_valid() {
            return Err(StoreError::validation(
                "line item",
                format!("product id {} is not positive", self.product_id),
            ));
        }
        if self.quantity < 1 || i32::try_from(self.quantity).is_err() {
            return Err(StoreError::validation(
                "line item",
                format!(
                    "quantity {} for product {} must be between 1 and {}",
                    self.quantity,
                    self.product_id,
                    i32::MAX
                ),
            ));
        }
        Ok(())
    }
}

/// One product purchased at one price and quantity. Never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

/// An order aggregate about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAggregate {
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub payment_type_id: PaymentTypeId,
    pub address: Option<String>,
    pub message: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewAggregate {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.user_id.is_valid() {
            return Err(StoreError::validation("aggregate", "user id is not positive"));
        }
        if !self.branch_id.is_valid() {
            return Err(StoreError::validation("aggregate", "branch id is not positive"));
        }
        if !self.payment_type_id.is_valid() {
            return Err(StoreError::validation(
                "aggregate",
                "payment type id is not positive",
            ));
        }
        if self.status.is_terminal() {
            return Err(StoreError::validation(
                "aggregate",
                format!("cannot be stored with terminal status {}", self.status),
            ));
        }
        Ok(())
    }
}

/// One checkout event, alive until it reaches the terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    pub id: AggregateId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub payment_type_id: PaymentTypeId,
    pub address: Option<String>,
    pub message: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Join row between an aggregate and one of its line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateLineItemRel {
    pub aggregate_id: AggregateId,
    pub line_item_id: LineItemId,
}

/// Everything written by one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub aggregate: NewAggregate,
    pub line_items: Vec<NewLineItem>,
}

/// How much of an aggregate's surroundings to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hydration {
    /// The aggregate row only.
    #[default]
    Bare,
    /// Line items with their products, the purchaser and the payment type.
    Details,
}

/// A line item together with the product it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedLineItem {
    #[serde(flatten)]
    pub line_item: LineItem,
    pub product: Option<Product>,
}

/// An aggregate as delivered to operators and purchasers.
///
/// With [`Hydration::Bare`] the nested collections are empty and the
/// optional joins are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedAggregate {
    #[serde(flatten)]
    pub aggregate: OrderAggregate,
    pub line_items: Vec<HydratedLineItem>,
    pub user: Option<Purchaser>,
    pub payment_type: Option<PaymentType>,
}

impl HydratedAggregate {
    pub fn bare(aggregate: OrderAggregate) -> Self {
        Self {
            aggregate,
            line_items: Vec::new(),
            user: None,
            payment_type: None,
        }
    }

    pub fn id(&self) -> AggregateId {
        self.aggregate.id
    }

    /// Sum of `quantity * unit_price` over the loaded line items.
    pub fn total(&self) -> Money {
        self.line_items
            .iter()
            .map(|item| item.line_item.unit_price.multiply(item.line_item.quantity))
            .sum()
    }
}
