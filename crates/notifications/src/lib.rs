//! Notification fan-out.
//!
//! Events are pushed to whichever operator sessions are connected at the
//! moment of sending. There is no queue, no persistence and no retry: an
//! operator who is offline simply misses the push and finds the order in the
//! pending queue instead.

pub mod error;
pub mod hub;
pub mod notifier;

pub use error::NotifyError;
pub use hub::{SessionHub, SessionId, Subscription};
pub use notifier::{NEW_ORDER_EVENT, Notification, Notifier};
