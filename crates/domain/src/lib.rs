//! Order lifecycle domain.
//!
//! This crate turns a basket checkout into a durable order aggregate and
//! moves it through the status workflow:
//! - [`Checkout`] and [`ChangeStatus`] commands with their validation rules
//! - [`OrderLifecycle`], the only writer of aggregates and line items
//! - [`StatusChange`], the outcome of a status request (update or archival)

pub mod error;
pub mod order;

pub use common::{Money, OrderStatus, StatusTransition};
pub use error::DomainError;
pub use order::{
    ChangeStatus, Checkout, CheckoutItem, LifecycleConfig, OrderError, OrderLifecycle,
    StatusChange, ValidatedCheckout,
};
