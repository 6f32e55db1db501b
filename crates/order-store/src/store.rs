use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderStatus;

use crate::directory::{BasketStore, Catalog, Directory};
use crate::{
    AggregateId, HydratedAggregate, Hydration, LineItemId, NewAggregate, NewLineItem, NewOrder,
    PendingFilter, ProductId, Result,
};

/// Core trait for order persistence.
///
/// The lifecycle manager is the only writer. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a batch of line items and returns their ids in input order.
    ///
    /// Fails with `Validation` if any quantity is below 1; the batch is one
    /// unit and nothing is written in that case.
    async fn create_line_items(&self, items: Vec<NewLineItem>) -> Result<Vec<LineItemId>>;

    /// Inserts an aggregate row.
    async fn create_aggregate(&self, aggregate: NewAggregate) -> Result<AggregateId>;

    /// Inserts one relation row per line item. Both sides must already exist.
    async fn link_line_items(
        &self,
        aggregate_id: AggregateId,
        line_item_ids: &[LineItemId],
    ) -> Result<()>;

    /// Writes line items, the aggregate and their links.
    ///
    /// The default runs the three steps in sequence: if the aggregate insert
    /// fails, the line items already written stay behind unreferenced.
    /// Backends that can do better override this with a single transaction.
    async fn place_order(&self, order: NewOrder) -> Result<AggregateId> {
        let line_item_ids = self.create_line_items(order.line_items).await?;
        let aggregate_id = self.create_aggregate(order.aggregate).await?;
        self.link_line_items(aggregate_id, &line_item_ids).await?;
        Ok(aggregate_id)
    }

    /// Loads an aggregate. Returns `None` if it does not exist (including
    /// after it was archived).
    async fn find_aggregate(
        &self,
        aggregate_id: AggregateId,
        hydration: Hydration,
    ) -> Result<Option<HydratedAggregate>>;

    /// Returns fully hydrated aggregates matching the filter, newest first.
    async fn list_pending(&self, filter: PendingFilter) -> Result<Vec<HydratedAggregate>>;

    /// Applies a status.
    ///
    /// The terminal status deletes the aggregate row and leaves line items and
    /// relation rows in place; any other status overwrites the field.
    /// Returns the number of affected rows, or `AggregateNotFound` if none.
    async fn set_status(&self, aggregate_id: AggregateId, status: OrderStatus) -> Result<u64>;

    /// Sums the quantity of line items for `product_id` created in
    /// `[start, end)`, whether or not their aggregate still exists.
    async fn quantity_between(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64>;
}

/// Everything the lifecycle service needs from one storage backend.
pub trait Backend:
    OrderStore + Directory + Catalog + BasketStore + Clone + Send + Sync + 'static
{
}

impl<T> Backend for T where
    T: OrderStore + Directory + Catalog + BasketStore + Clone + Send + Sync + 'static
{
}
