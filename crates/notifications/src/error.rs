//! Notification error types.

use thiserror::Error;

/// Errors that can occur while pushing a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The push transport is not reachable.
    #[error("Push transport unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for notification results.
pub type Result<T> = std::result::Result<T, NotifyError>;
