//! Read-side collaborators owned by the surrounding catalog system.
//!
//! The order lifecycle never writes branches, operators, products or payment
//! types. Its only write outside its own tables is the post-checkout basket
//! clear.

use async_trait::async_trait;
use common::Money;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::{BranchId, OperatorId, PaymentTypeId, ProductId, UserId};

/// Whether an operator account is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStatus {
    #[default]
    Active,
    Inactive,
}

impl OperatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorStatus::Active => "active",
            OperatorStatus::Inactive => "inactive",
        }
    }
}

/// Staff account that manages orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: OperatorId,
    /// `None` means global scope: the operator sees every branch.
    pub branch_id: Option<BranchId>,
    pub status: OperatorStatus,
}

impl Operator {
    pub fn global(id: OperatorId) -> Self {
        Self {
            id,
            branch_id: None,
            status: OperatorStatus::Active,
        }
    }

    pub fn for_branch(id: OperatorId, branch_id: BranchId) -> Self {
        Self {
            id,
            branch_id: Some(branch_id),
            status: OperatorStatus::Active,
        }
    }

    /// Returns true if this operator should hear about orders for `branch_id`.
    pub fn covers(&self, branch_id: BranchId) -> bool {
        self.branch_id.is_none_or(|own| own == branch_id)
    }
}

/// Catalog product as seen by the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
}

/// Public profile of the purchasing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchaser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_num: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    pub id: PaymentTypeId,
    pub name: String,
}

/// A pending basket selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Branch and operator lookups.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Returns true if a branch with this id exists.
    async fn branch_exists(&self, branch_id: BranchId) -> Result<bool>;

    /// Returns every operator scoped to `branch_id` plus every global operator,
    /// deduplicated and in ascending id order.
    async fn operators_for_branch(&self, branch_id: BranchId) -> Result<Vec<OperatorId>>;
}

/// Product lookups.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>>;
}

/// The purchaser's pending selections.
#[async_trait]
pub trait BasketStore: Send + Sync {
    /// Removes every basket entry of `user_id`; returns how many were removed.
    async fn clear_basket(&self, user_id: UserId) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_operator_covers_every_branch() {
        let operator = Operator::global(OperatorId::new(1));
        assert!(operator.covers(BranchId::new(1)));
        assert!(operator.covers(BranchId::new(99)));
    }

    #[test]
    fn scoped_operator_covers_only_its_branch() {
        let operator = Operator::for_branch(OperatorId::new(2), BranchId::new(3));
        assert!(operator.covers(BranchId::new(3)));
        assert!(!operator.covers(BranchId::new(4)));
    }
}
