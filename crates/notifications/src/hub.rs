//! Registry of live operator sessions.

use std::collections::{BTreeSet, HashMap};
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use async_trait::async_trait;
use common::OperatorId;
use futures_core::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;
use crate::notifier::{Notification, Notifier};

/// Identifies one connection of one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Session {
    id: SessionId,
    sender: mpsc::UnboundedSender<Notification>,
}

type Sessions = Arc<RwLock<HashMap<OperatorId, Vec<Session>>>>;

/// In-process fan-out over unbounded channels.
///
/// Each [`Subscription`] is one live connection; dropping it unregisters the
/// session. Sending never blocks.
#[derive(Debug, Clone, Default)]
pub struct SessionHub {
    sessions: Sessions,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `operator_id`.
    pub fn register(&self, operator_id: OperatorId) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SessionId::new();

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(operator_id)
            .or_default()
            .push(Session { id, sender });
        let active: usize = sessions.values().map(Vec::len).sum();
        drop(sessions);

        metrics::gauge!("operator_sessions_active").set(active as f64);
        tracing::debug!(%operator_id, session_id = %id, "operator session registered");

        Subscription {
            session_id: id,
            operator_id,
            receiver,
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// Returns the number of live sessions for `operator_id`.
    pub fn session_count(&self, operator_id: OperatorId) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operator_id)
            .map_or(0, Vec::len)
    }

    /// Returns true if `operator_id` has at least one live session.
    pub fn is_connected(&self, operator_id: OperatorId) -> bool {
        self.session_count(operator_id) > 0
    }

    /// Returns the number of live sessions across all operators.
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn prune_closed(&self) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        for list in sessions.values_mut() {
            list.retain(|session| !session.sender.is_closed());
        }
        sessions.retain(|_, list| !list.is_empty());
    }
}

#[async_trait]
impl Notifier for SessionHub {
    async fn notify(&self, operators: &[OperatorId], notification: Notification) -> Result<usize> {
        let targets: BTreeSet<OperatorId> = operators.iter().copied().collect();
        let mut delivered = 0;
        let mut saw_closed = false;

        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            for operator_id in &targets {
                let Some(list) = sessions.get(operator_id) else {
                    continue;
                };
                for session in list {
                    if session.sender.send(notification.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        saw_closed = true;
                    }
                }
            }
        }

        if saw_closed {
            self.prune_closed();
        }

        tracing::debug!(
            event = %notification.event,
            targets = targets.len(),
            delivered,
            "notification fanned out"
        );
        Ok(delivered)
    }
}

/// One live operator connection. Yields notifications as a [`Stream`].
#[derive(Debug)]
pub struct Subscription {
    session_id: SessionId,
    operator_id: OperatorId,
    receiver: mpsc::UnboundedReceiver<Notification>,
    sessions: Sessions,
}

impl Subscription {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn operator_id(&self) -> OperatorId {
        self.operator_id
    }

    /// Waits for the next notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }

    /// Returns a notification if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = sessions.get_mut(&self.operator_id) {
            list.retain(|session| session.id != self.session_id);
            if list.is_empty() {
                sessions.remove(&self.operator_id);
            }
        }
        let active: usize = sessions.values().map(Vec::len).sum();
        drop(sessions);

        metrics::gauge!("operator_sessions_active").set(active as f64);
        tracing::debug!(
            operator_id = %self.operator_id,
            session_id = %self.session_id,
            "operator session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn order_event(id: i64) -> Notification {
        Notification::new("new-order", serde_json::json!({ "order": { "id": id } }))
    }

    #[tokio::test]
    async fn delivers_to_every_session_of_listed_operators() {
        let hub = SessionHub::new();
        let mut first = hub.register(OperatorId::new(1));
        let mut second = hub.register(OperatorId::new(1));
        let mut other = hub.register(OperatorId::new(2));
        assert_eq!(hub.active_sessions(), 3);

        let delivered = hub
            .notify(&[OperatorId::new(1)], order_event(5))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(first.try_recv(), Some(order_event(5)));
        assert_eq!(second.try_recv(), Some(order_event(5)));
        assert_eq!(other.try_recv(), None);
    }

    #[tokio::test]
    async fn offline_operators_are_skipped_silently() {
        let hub = SessionHub::new();
        let delivered = hub
            .notify(&[OperatorId::new(1), OperatorId::new(9)], order_event(1))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn duplicate_targets_receive_once() {
        let hub = SessionHub::new();
        let mut session = hub.register(OperatorId::new(3));

        let delivered = hub
            .notify(&[OperatorId::new(3), OperatorId::new(3)], order_event(1))
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        assert!(session.try_recv().is_some());
        assert!(session.try_recv().is_none());
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_session() {
        let hub = SessionHub::new();
        let session = hub.register(OperatorId::new(4));
        assert!(hub.is_connected(OperatorId::new(4)));

        drop(session);

        assert!(!hub.is_connected(OperatorId::new(4)));
        let delivered = hub
            .notify(&[OperatorId::new(4)], order_event(1))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn no_replay_for_late_subscribers() {
        let hub = SessionHub::new();
        hub.notify(&[OperatorId::new(1)], order_event(1))
            .await
            .unwrap();

        let mut late = hub.register(OperatorId::new(1));
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn subscription_is_a_stream() {
        let hub = SessionHub::new();
        let mut session = hub.register(OperatorId::new(1));

        hub.notify(&[OperatorId::new(1)], order_event(8))
            .await
            .unwrap();

        let next = session.next().await.unwrap();
        assert_eq!(next.event, "new-order");
        assert_eq!(next.payload["order"]["id"], 8);
    }
}
