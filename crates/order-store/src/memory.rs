use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderStatus, StatusTransition};
use tokio::sync::RwLock;

use crate::directory::{
    BasketEntry, BasketStore, Catalog, Directory, Operator, PaymentType, Product, Purchaser,
};
use crate::store::OrderStore;
use crate::{
    AggregateId, AggregateLineItemRel, BranchId, HydratedAggregate, HydratedLineItem, Hydration,
    LineItem, LineItemId, NewAggregate, NewLineItem, NewOrder, OperatorId, OrderAggregate,
    PaymentTypeId, PendingFilter, ProductId, Result, StoreError, UserId,
};

#[derive(Debug, Default)]
struct InMemoryState {
    line_items: BTreeMap<LineItemId, LineItem>,
    aggregates: BTreeMap<AggregateId, OrderAggregate>,
    relations: Vec<AggregateLineItemRel>,
    next_line_item_id: i64,
    next_aggregate_id: i64,
    fail_on_create_aggregate: bool,

    branches: HashSet<BranchId>,
    operators: Vec<Operator>,
    products: HashMap<ProductId, Product>,
    users: HashMap<UserId, Purchaser>,
    payment_types: HashMap<PaymentTypeId, PaymentType>,
    baskets: HashMap<UserId, Vec<BasketEntry>>,
}

impl InMemoryState {
    fn insert_line_items(&mut self, items: Vec<NewLineItem>) -> Vec<LineItemId> {
        items
            .into_iter()
            .map(|item| {
                self.next_line_item_id += 1;
                let id = LineItemId::new(self.next_line_item_id);
                self.line_items.insert(
                    id,
                    LineItem {
                        id,
                        product_id: item.product_id,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        created_at: item.created_at,
                    },
                );
                id
            })
            .collect()
    }

    fn insert_aggregate(&mut self, aggregate: NewAggregate) -> AggregateId {
        self.next_aggregate_id += 1;
        let id = AggregateId::new(self.next_aggregate_id);
        self.aggregates.insert(
            id,
            OrderAggregate {
                id,
                user_id: aggregate.user_id,
                branch_id: aggregate.branch_id,
                payment_type_id: aggregate.payment_type_id,
                address: aggregate.address,
                message: aggregate.message,
                status: aggregate.status,
                created_at: aggregate.created_at,
            },
        );
        id
    }

    fn insert_relations(&mut self, aggregate_id: AggregateId, line_item_ids: &[LineItemId]) {
        self.relations
            .extend(line_item_ids.iter().map(|&line_item_id| AggregateLineItemRel {
                aggregate_id,
                line_item_id,
            }));
    }

    fn hydrate(&self, aggregate: &OrderAggregate, hydration: Hydration) -> HydratedAggregate {
        if hydration == Hydration::Bare {
            return HydratedAggregate::bare(aggregate.clone());
        }

        let mut line_items: Vec<HydratedLineItem> = self
            .relations
            .iter()
            .filter(|rel| rel.aggregate_id == aggregate.id)
            .filter_map(|rel| self.line_items.get(&rel.line_item_id))
            .map(|line_item| HydratedLineItem {
                line_item: line_item.clone(),
                product: self.products.get(&line_item.product_id).cloned(),
            })
            .collect();
        line_items.sort_by_key(|item| item.line_item.id);

        HydratedAggregate {
            aggregate: aggregate.clone(),
            line_items,
            user: self.users.get(&aggregate.user_id).cloned(),
            payment_type: self.payment_types.get(&aggregate.payment_type_id).cloned(),
        }
    }
}

/// In-memory backend for tests and local runs.
///
/// Holds both the order tables and a small stand-in for the surrounding
/// catalog (branches, operators, products, users, payment types, baskets),
/// so a single value satisfies every storage trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_branch(&self, branch_id: BranchId) {
        self.state.write().await.branches.insert(branch_id);
    }

    pub async fn add_operator(&self, operator: Operator) {
        self.state.write().await.operators.push(operator);
    }

    /// Removes an operator, e.g. to simulate roster changes.
    pub async fn remove_operator(&self, operator_id: OperatorId) {
        self.state
            .write()
            .await
            .operators
            .retain(|operator| operator.id != operator_id);
    }

    pub async fn add_product(&self, product: Product) {
        self.state.write().await.products.insert(product.id, product);
    }

    pub async fn add_user(&self, user: Purchaser) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn add_payment_type(&self, payment_type: PaymentType) {
        self.state
            .write()
            .await
            .payment_types
            .insert(payment_type.id, payment_type);
    }

    pub async fn add_basket_entry(&self, user_id: UserId, entry: BasketEntry) {
        self.state
            .write()
            .await
            .baskets
            .entry(user_id)
            .or_default()
            .push(entry);
    }

    /// Returns the number of basket entries held for `user_id`.
    pub async fn basket_len(&self, user_id: UserId) -> usize {
        self.state
            .read()
            .await
            .baskets
            .get(&user_id)
            .map_or(0, Vec::len)
    }

    /// Returns the total number of line items, linked or not.
    pub async fn line_item_count(&self) -> usize {
        self.state.read().await.line_items.len()
    }

    /// Returns the line item ids linked to an aggregate, whether or not the
    /// aggregate row still exists.
    pub async fn linked_line_items(&self, aggregate_id: AggregateId) -> Vec<LineItemId> {
        self.state
            .read()
            .await
            .relations
            .iter()
            .filter(|rel| rel.aggregate_id == aggregate_id)
            .map(|rel| rel.line_item_id)
            .collect()
    }

    /// Returns line items referenced by no relation row.
    pub async fn orphaned_line_items(&self) -> Vec<LineItemId> {
        let state = self.state.read().await;
        let linked: HashSet<LineItemId> =
            state.relations.iter().map(|rel| rel.line_item_id).collect();
        state
            .line_items
            .keys()
            .filter(|id| !linked.contains(*id))
            .copied()
            .collect()
    }

    /// Configures the store to fail every aggregate insert.
    pub async fn set_fail_on_create_aggregate(&self, fail: bool) {
        self.state.write().await.fail_on_create_aggregate = fail;
    }

    /// Clears all rows, catalog included.
    pub async fn clear(&self) {
        *self.state.write().await = InMemoryState::default();
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_line_items(&self, items: Vec<NewLineItem>) -> Result<Vec<LineItemId>> {
        for item in &items {
            item.validate()?;
        }
        Ok(self.state.write().await.insert_line_items(items))
    }

    async fn create_aggregate(&self, aggregate: NewAggregate) -> Result<AggregateId> {
        aggregate.validate()?;
        let mut state = self.state.write().await;
        if state.fail_on_create_aggregate {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(state.insert_aggregate(aggregate))
    }

    async fn link_line_items(
        &self,
        aggregate_id: AggregateId,
        line_item_ids: &[LineItemId],
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.aggregates.contains_key(&aggregate_id) {
            return Err(StoreError::AggregateNotFound(aggregate_id));
        }
        if let Some(missing) = line_item_ids
            .iter()
            .find(|id| !state.line_items.contains_key(*id))
        {
            return Err(StoreError::validation(
                "relation",
                format!("line item {missing} does not exist"),
            ));
        }
        state.insert_relations(aggregate_id, line_item_ids);
        Ok(())
    }

    async fn place_order(&self, order: NewOrder) -> Result<AggregateId> {
        order.aggregate.validate()?;
        for item in &order.line_items {
            item.validate()?;
        }

        let mut state = self.state.write().await;
        if state.fail_on_create_aggregate {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let line_item_ids = state.insert_line_items(order.line_items);
        let aggregate_id = state.insert_aggregate(order.aggregate);
        state.insert_relations(aggregate_id, &line_item_ids);
        Ok(aggregate_id)
    }

    async fn find_aggregate(
        &self,
        aggregate_id: AggregateId,
        hydration: Hydration,
    ) -> Result<Option<HydratedAggregate>> {
        let state = self.state.read().await;
        Ok(state
            .aggregates
            .get(&aggregate_id)
            .map(|aggregate| state.hydrate(aggregate, hydration)))
    }

    async fn list_pending(&self, filter: PendingFilter) -> Result<Vec<HydratedAggregate>> {
        let state = self.state.read().await;
        let mut aggregates: Vec<&OrderAggregate> = state
            .aggregates
            .values()
            .filter(|a| filter.matches(a.branch_id, a.user_id, a.status))
            .collect();
        aggregates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(aggregates
            .into_iter()
            .map(|aggregate| state.hydrate(aggregate, Hydration::Details))
            .collect())
    }

    async fn set_status(&self, aggregate_id: AggregateId, status: OrderStatus) -> Result<u64> {
        let mut state = self.state.write().await;
        match status.transition() {
            StatusTransition::Archive => state
                .aggregates
                .remove(&aggregate_id)
                .map(|_| 1)
                .ok_or(StoreError::AggregateNotFound(aggregate_id)),
            StatusTransition::Advance(status) => state
                .aggregates
                .get_mut(&aggregate_id)
                .map(|aggregate| {
                    aggregate.status = status;
                    1
                })
                .ok_or(StoreError::AggregateNotFound(aggregate_id)),
        }
    }

    async fn quantity_between(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .line_items
            .values()
            .filter(|item| {
                item.product_id == product_id && item.created_at >= start && item.created_at < end
            })
            .map(|item| u64::from(item.quantity))
            .sum())
    }
}

#[async_trait]
impl Directory for InMemoryStore {
    async fn branch_exists(&self, branch_id: BranchId) -> Result<bool> {
        Ok(self.state.read().await.branches.contains(&branch_id))
    }

    async fn operators_for_branch(&self, branch_id: BranchId) -> Result<Vec<OperatorId>> {
        let state = self.state.read().await;
        let mut ids: Vec<OperatorId> = state
            .operators
            .iter()
            .filter(|operator| operator.covers(branch_id))
            .map(|operator| operator.id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl BasketStore for InMemoryStore {
    async fn clear_basket(&self, user_id: UserId) -> Result<u64> {
        let removed = self
            .state
            .write()
            .await
            .baskets
            .remove(&user_id)
            .map_or(0, |entries| entries.len());
        Ok(removed as u64)
    }
}
