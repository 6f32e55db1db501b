//! Shared types for the order lifecycle service.
//!
//! - Typed integer identifiers for every persisted entity
//! - [`Money`] in minor units
//! - [`OrderStatus`], the five-label status set, and its [`StatusTransition`] projection

pub mod ids;
pub mod money;
pub mod status;

pub use ids::{AggregateId, BranchId, LineItemId, OperatorId, PaymentTypeId, ProductId, UserId};
pub use money::Money;
pub use status::{OrderStatus, StatusTransition, UnknownStatus};
