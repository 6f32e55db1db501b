//! Persistence for the order lifecycle.
//!
//! - [`OrderStore`]: line items, order aggregates and the join between them
//! - [`Directory`], [`Catalog`], [`BasketStore`]: read access to branches and
//!   operators, product prices, and the purchaser's basket
//! - [`InMemoryStore`] and [`PostgresStore`] implement all four

pub mod directory;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{AggregateId, BranchId, LineItemId, OperatorId, PaymentTypeId, ProductId, UserId};
pub use directory::{
    BasketEntry, BasketStore, Catalog, Directory, Operator, OperatorStatus, PaymentType, Product,
    Purchaser,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    AggregateLineItemRel, Hydration, HydratedAggregate, HydratedLineItem, LineItem, NewAggregate,
    NewLineItem, NewOrder, OrderAggregate,
};
pub use postgres::PostgresStore;
pub use query::PendingFilter;
pub use store::{Backend, OrderStore};
