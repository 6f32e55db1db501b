use async_trait::async_trait;
use common::OperatorId;
use serde::Serialize;

use crate::error::Result;

/// Event name pushed to operators when a checkout completes.
pub const NEW_ORDER_EVENT: &str = "new-order";

/// A named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: String,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Trait for pushing events to operators.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `notification` to every live session of every listed
    /// operator. Returns the number of sessions reached; operators without a
    /// live session are skipped silently.
    async fn notify(&self, operators: &[OperatorId], notification: Notification) -> Result<usize>;
}
