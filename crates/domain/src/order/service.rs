//! Order lifecycle service.

use std::time::{Duration, Instant};

use chrono::Utc;
use common::{AggregateId, BranchId, OperatorId, OrderStatus, PaymentTypeId, StatusTransition, UserId};
use notifications::{NEW_ORDER_EVENT, Notification, Notifier};
use order_store::{
    Backend, HydratedAggregate, Hydration, NewAggregate, NewLineItem, NewOrder, PendingFilter,
    StoreError,
};
use serde::Serialize;

use crate::error::DomainError;

use super::{ChangeStatus, Checkout, OrderError};

/// Tunables for the lifecycle service.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Payment type that requires a delivery address.
    pub delivery_payment_type: PaymentTypeId,
    /// Upper bound on the operator push; checkout never waits longer.
    pub notify_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            delivery_payment_type: PaymentTypeId::new(1),
            notify_timeout: Duration::from_millis(500),
        }
    }
}

/// Outcome of a status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusChange {
    /// The status field was overwritten.
    Updated { status: OrderStatus, affected: u64 },
    /// The order was received and its aggregate deleted.
    Archived { removed: u64 },
}

impl StatusChange {
    /// Number of aggregate rows touched; 0 means no such aggregate.
    pub fn affected(&self) -> u64 {
        match self {
            StatusChange::Updated { affected, .. } => *affected,
            StatusChange::Archived { removed } => *removed,
        }
    }
}

#[derive(Serialize)]
struct NewOrderPayload<'a> {
    order: &'a HydratedAggregate,
}

/// The single writer of order aggregates and line items.
///
/// Checkout validates the request, snapshots product prices, writes the
/// order as one unit, pushes it to the branch's operators and clears the
/// purchaser's basket. Status changes either overwrite the status or, for
/// `received`, delete the aggregate.
pub struct OrderLifecycle<S: Backend, N: Notifier> {
    store: S,
    notifier: N,
    config: LifecycleConfig,
}

impl<S: Backend, N: Notifier> OrderLifecycle<S, N> {
    /// Creates a service with the default configuration.
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_config(store, notifier, LifecycleConfig::default())
    }

    pub fn with_config(store: S, notifier: N, config: LifecycleConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Places an order from a checkout request and returns it fully hydrated.
    #[tracing::instrument(
        skip(self, cmd),
        fields(user_id = %cmd.user_id, branch_id = %cmd.branch_id)
    )]
    pub async fn create_order(&self, cmd: Checkout) -> Result<HydratedAggregate, DomainError> {
        let started = Instant::now();
        let checkout = cmd.validate(self.config.delivery_payment_type)?;

        if !self.store.branch_exists(checkout.branch_id).await? {
            return Err(OrderError::BranchNotFound(checkout.branch_id).into());
        }

        let now = Utc::now();
        let mut line_items = Vec::with_capacity(checkout.line_items.len());
        for &(product_id, quantity) in &checkout.line_items {
            let product = self
                .store
                .find_product(product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(product_id))?;
            line_items.push(NewLineItem::new(product_id, quantity, product.price, now));
        }

        let aggregate_id = self
            .store
            .place_order(NewOrder {
                aggregate: NewAggregate {
                    user_id: checkout.user_id,
                    branch_id: checkout.branch_id,
                    payment_type_id: checkout.payment_type_id,
                    address: checkout.address,
                    message: checkout.message,
                    status: OrderStatus::Pending,
                    created_at: now,
                },
                line_items,
            })
            .await?;
        metrics::counter!("orders_created_total").increment(1);

        let order = self
            .store
            .find_aggregate(aggregate_id, Hydration::Details)
            .await?
            .ok_or(DomainError::AggregateNotFound(aggregate_id))?;

        self.push_new_order(checkout.branch_id, &order).await;

        let cleared = self.store.clear_basket(checkout.user_id).await?;
        metrics::counter!("baskets_cleared_total").increment(1);

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%aggregate_id, line_items = order.line_items.len(), cleared, "order created");

        Ok(order)
    }

    /// Resolves the branch audience and pushes `new-order` to it.
    ///
    /// Failures are logged and counted, never returned.
    async fn push_new_order(&self, branch_id: BranchId, order: &HydratedAggregate) {
        let audience: Vec<OperatorId> = match self.store.operators_for_branch(branch_id).await {
            Ok(audience) => audience,
            Err(e) => {
                metrics::counter!("order_notification_failures_total").increment(1);
                tracing::warn!(error = %e, %branch_id, "could not resolve notification audience");
                return;
            }
        };

        let payload = match serde_json::to_value(NewOrderPayload { order }) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!("order_notification_failures_total").increment(1);
                tracing::warn!(error = %e, "could not serialize order for push");
                return;
            }
        };

        let push = self
            .notifier
            .notify(&audience, Notification::new(NEW_ORDER_EVENT, payload));
        match tokio::time::timeout(self.config.notify_timeout, push).await {
            Ok(Ok(delivered)) => {
                metrics::counter!("order_notifications_sent_total").increment(delivered as u64);
                tracing::debug!(
                    aggregate_id = %order.id(),
                    audience = audience.len(),
                    delivered,
                    "new order pushed"
                );
            }
            Ok(Err(e)) => {
                metrics::counter!("order_notification_failures_total").increment(1);
                tracing::warn!(error = %e, aggregate_id = %order.id(), "new order push failed");
            }
            Err(_) => {
                metrics::counter!("order_notification_failures_total").increment(1);
                tracing::warn!(
                    aggregate_id = %order.id(),
                    timeout_ms = self.config.notify_timeout.as_millis() as u64,
                    "new order push timed out"
                );
            }
        }
    }

    /// Moves an aggregate to another status.
    ///
    /// A missing aggregate is not an error: the outcome carries a zero count.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, cmd: ChangeStatus) -> Result<StatusChange, DomainError> {
        let status = cmd.validate()?;

        let affected = match self.store.set_status(cmd.aggregate_id, status).await {
            Ok(affected) => affected,
            Err(StoreError::AggregateNotFound(_)) => 0,
            Err(e) => return Err(e.into()),
        };
        metrics::counter!("order_status_changes_total").increment(1);

        let outcome = match status.transition() {
            StatusTransition::Archive => {
                metrics::counter!("orders_archived_total").increment(affected);
                StatusChange::Archived { removed: affected }
            }
            StatusTransition::Advance(status) => StatusChange::Updated { status, affected },
        };

        tracing::info!(aggregate_id = %cmd.aggregate_id, %status, affected, "order status changed");
        Ok(outcome)
    }

    /// Loads one non-received order with its details.
    ///
    /// Returns `None` if the order does not exist or was already received.
    #[tracing::instrument(skip(self))]
    pub async fn get_pending_order(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<HydratedAggregate>, DomainError> {
        if !aggregate_id.is_valid() {
            return Err(OrderError::validation("id", "must be a positive id").into());
        }
        Ok(self
            .store
            .find_aggregate(aggregate_id, Hydration::Details)
            .await?)
    }

    /// Operator queue: every non-received order, optionally for one branch.
    #[tracing::instrument(skip(self))]
    pub async fn list_pending(
        &self,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<HydratedAggregate>, DomainError> {
        let mut filter = PendingFilter::new();
        if let Some(branch_id) = branch_id {
            filter = filter.branch_id(branch_id);
        }
        Ok(self.store.list_pending(filter).await?)
    }

    /// Purchaser queue: the caller's own non-received orders.
    #[tracing::instrument(skip(self))]
    pub async fn list_user_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<HydratedAggregate>, DomainError> {
        Ok(self
            .store
            .list_pending(PendingFilter::new().user_id(user_id))
            .await?)
    }
}
