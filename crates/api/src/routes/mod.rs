//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod operators;
pub mod orders;
pub mod statistics;
