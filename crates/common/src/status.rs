//! Order status labels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order aggregate.
///
/// ```text
/// pending ──► processing ──► ready ──► in_transit ──► received
///                                                     (aggregate deleted)
/// ```
///
/// Only the label set is enforced: any non-terminal label may follow any
/// other. `Received` is never stored; reaching it removes the aggregate row
/// and leaves its line items behind as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Freshly checked out, awaiting an operator.
    #[default]
    Pending,

    /// An operator is assembling the order.
    Processing,

    /// Assembled and waiting for pickup or courier.
    Ready,

    /// Out for delivery.
    InTransit,

    /// Handed to the purchaser (terminal state).
    Received,
}

/// Effect of moving an aggregate to a requested status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Overwrite the stored status.
    Advance(OrderStatus),
    /// Delete the aggregate row; line items and relation rows persist.
    Archive,
}

/// A status label outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    /// Every label, in workflow order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Ready,
        OrderStatus::InTransit,
        OrderStatus::Received,
    ];

    /// Returns true if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Received)
    }

    /// Returns true if this label may be requested through a status change.
    ///
    /// `Pending` is only ever assigned at checkout.
    pub fn is_change_target(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Projects the requested status onto its storage effect.
    pub fn transition(self) -> StatusTransition {
        if self.is_terminal() {
            StatusTransition::Archive
        } else {
            StatusTransition::Advance(self)
        }
    }

    /// Returns the wire/storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Ready => "ready",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Received => "received",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_received_is_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
        assert!(!OrderStatus::InTransit.is_terminal());
        assert!(OrderStatus::Received.is_terminal());
    }

    #[test]
    fn test_transition_projection() {
        assert_eq!(
            OrderStatus::Ready.transition(),
            StatusTransition::Advance(OrderStatus::Ready)
        );
        assert_eq!(OrderStatus::Received.transition(), StatusTransition::Archive);
    }

    #[test]
    fn test_pending_is_not_a_change_target() {
        assert!(!OrderStatus::Pending.is_change_target());
        assert!(OrderStatus::InTransit.is_change_target());
        assert!(OrderStatus::Received.is_change_target());
    }

    #[test]
    fn test_parse_round_trips_every_label() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_labels() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("shipped".to_string()));
        assert!("Ready".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case_labels() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
    }
}
