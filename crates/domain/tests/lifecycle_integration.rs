//! Integration tests for the order lifecycle.
//!
//! These run the full checkout and status workflow against the in-memory
//! backend and a live session hub.

use chrono::{Duration, Utc};
use common::{BranchId, OperatorId, PaymentTypeId, ProductId, UserId};
use domain::{
    ChangeStatus, Checkout, CheckoutItem, DomainError, LifecycleConfig, Money, OrderLifecycle,
    OrderStatus, StatusChange,
};
use notifications::{NEW_ORDER_EVENT, SessionHub};
use order_store::{
    BasketEntry, Directory, Hydration, InMemoryStore, Operator, OrderStore, PaymentType, Product,
    Purchaser,
};

const DELIVERY: PaymentTypeId = PaymentTypeId::new(1);
const PICKUP: PaymentTypeId = PaymentTypeId::new(2);

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_branch(BranchId::new(1)).await;
    store.add_branch(BranchId::new(2)).await;
    store
        .add_user(Purchaser {
            id: UserId::new(1),
            first_name: "Ani".to_string(),
            last_name: "Petrosyan".to_string(),
            email: "ani@example.com".to_string(),
            phone_num: "+37491000000".to_string(),
        })
        .await;
    store
        .add_payment_type(PaymentType {
            id: DELIVERY,
            name: "delivery".to_string(),
        })
        .await;
    store
        .add_payment_type(PaymentType {
            id: PICKUP,
            name: "pickup".to_string(),
        })
        .await;
    for (id, price) in [(7, 250), (8, 1000), (9, 90)] {
        store
            .add_product(Product {
                id: ProductId::new(id),
                name: format!("product-{id}"),
                price: Money::from_cents(price),
            })
            .await;
    }
    store.add_operator(Operator::global(OperatorId::new(1))).await;
    store
        .add_operator(Operator::for_branch(OperatorId::new(2), BranchId::new(1)))
        .await;
    store
        .add_operator(Operator::for_branch(OperatorId::new(3), BranchId::new(2)))
        .await;
    store
}

fn create_service(store: &InMemoryStore) -> OrderLifecycle<InMemoryStore, SessionHub> {
    OrderLifecycle::new(store.clone(), SessionHub::new())
}

fn pickup(items: Vec<CheckoutItem>) -> Checkout {
    Checkout::new(UserId::new(1), BranchId::new(1), PICKUP, items)
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn single_item_pickup_scenario() {
        let store = seeded_store().await;
        let service = create_service(&store);

        let order = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 3)]))
            .await
            .unwrap();

        assert_eq!(order.aggregate.status, OrderStatus::Pending);
        assert_eq!(order.aggregate.branch_id, BranchId::new(1));
        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.line_items[0].line_item.quantity, 3);
        assert_eq!(
            order.line_items[0].product.as_ref().map(|p| p.id),
            Some(ProductId::new(7))
        );
        assert_eq!(order.user.as_ref().map(|u| u.id), Some(UserId::new(1)));
        assert_eq!(order.payment_type.as_ref().map(|p| p.id), Some(PICKUP));

        let pending = service.list_pending(None).await.unwrap();
        assert_eq!(pending.len(), 1);

        service
            .change_status(ChangeStatus::new(order.id(), "received"))
            .await
            .unwrap();
        assert!(service.list_pending(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_submitted_item_gets_exactly_one_relation() {
        let store = seeded_store().await;
        let service = create_service(&store);

        let items = vec![
            CheckoutItem::new(ProductId::new(7), 1),
            CheckoutItem::new(ProductId::new(8), 2),
            CheckoutItem::new(ProductId::new(7), 4),
            CheckoutItem::new(ProductId::new(9), 10),
        ];
        let order = service.create_order(pickup(items.clone())).await.unwrap();

        let linked = store.linked_line_items(order.id()).await;
        assert_eq!(linked.len(), items.len());
        assert_eq!(order.line_items.len(), items.len());

        let mut returned: Vec<_> = order.line_items.iter().map(|li| li.line_item.id).collect();
        returned.sort();
        let mut linked = linked;
        linked.sort();
        assert_eq!(returned, linked);
        assert!(store.orphaned_line_items().await.is_empty());
        assert_eq!(order.total(), Money::from_cents(250 + 2000 + 1000 + 900));
    }

    #[tokio::test]
    async fn delivery_requires_address_but_pickup_does_not() {
        let store = seeded_store().await;
        let service = create_service(&store);
        let items = vec![CheckoutItem::new(ProductId::new(7), 1)];

        let delivery = Checkout::new(UserId::new(1), BranchId::new(1), DELIVERY, items.clone());
        let err = service.create_order(delivery).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.line_item_count().await, 0);

        let order = service.create_order(pickup(items.clone())).await.unwrap();
        assert_eq!(order.aggregate.address, None);

        let delivery = Checkout::new(UserId::new(1), BranchId::new(1), DELIVERY, items)
            .with_address("5 Tumanyan St")
            .with_message("ring twice");
        let order = service.create_order(delivery).await.unwrap();
        assert_eq!(order.aggregate.address.as_deref(), Some("5 Tumanyan St"));
        assert_eq!(order.aggregate.message.as_deref(), Some("ring twice"));
    }

    #[tokio::test]
    async fn configured_delivery_type_is_honoured() {
        let store = seeded_store().await;
        let config = LifecycleConfig {
            delivery_payment_type: PICKUP,
            ..LifecycleConfig::default()
        };
        let service = OrderLifecycle::with_config(store.clone(), SessionHub::new(), config);

        let err = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 1)]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn basket_is_emptied_even_when_already_empty() {
        let store = seeded_store().await;
        let service = create_service(&store);
        store
            .add_basket_entry(
                UserId::new(1),
                BasketEntry {
                    product_id: ProductId::new(8),
                    quantity: 2,
                },
            )
            .await;

        service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(8), 2)]))
            .await
            .unwrap();
        assert_eq!(store.basket_len(UserId::new(1)).await, 0);

        service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(8), 1)]))
            .await
            .unwrap();
        assert_eq!(store.basket_len(UserId::new(1)).await, 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let store = seeded_store().await;
        let service = create_service(&store);
        store
            .add_basket_entry(
                UserId::new(1),
                BasketEntry {
                    product_id: ProductId::new(7),
                    quantity: 1,
                },
            )
            .await;
        store.set_fail_on_create_aggregate(true).await;

        let err = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(store.line_item_count().await, 0);
        assert_eq!(store.basket_len(UserId::new(1)).await, 1);
    }

    #[tokio::test]
    async fn push_reaches_branch_and_global_operators_only() {
        let store = seeded_store().await;
        let hub = SessionHub::new();
        let mut global = hub.register(OperatorId::new(1));
        let mut branch_one = hub.register(OperatorId::new(2));
        let mut branch_two = hub.register(OperatorId::new(3));
        let service = OrderLifecycle::new(store, hub);

        let order = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 2)]))
            .await
            .unwrap();

        let pushed = branch_one.recv().await.unwrap();
        assert_eq!(pushed.event, NEW_ORDER_EVENT);
        assert_eq!(pushed.payload["order"]["id"], order.id().get());
        assert_eq!(pushed.payload["order"]["status"], "pending");
        assert!(global.recv().await.is_some());
        assert!(branch_two.try_recv().is_none());
    }
}

mod audience {
    use super::*;

    #[tokio::test]
    async fn global_operators_cover_every_branch() {
        let store = seeded_store().await;
        store.add_operator(Operator::global(OperatorId::new(10))).await;

        for branch in [1, 2, 3, 999] {
            let audience = store
                .operators_for_branch(BranchId::new(branch))
                .await
                .unwrap();
            assert!(audience.contains(&OperatorId::new(1)), "branch {branch}");
            assert!(audience.contains(&OperatorId::new(10)), "branch {branch}");
        }
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn walks_the_workflow_and_archives_on_received() {
        let store = seeded_store().await;
        let service = create_service(&store);
        let order = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 3)]))
            .await
            .unwrap();
        let id = order.id();

        for (label, status) in [
            ("processing", OrderStatus::Processing),
            ("ready", OrderStatus::Ready),
            ("in_transit", OrderStatus::InTransit),
        ] {
            let outcome = service
                .change_status(ChangeStatus::new(id, label))
                .await
                .unwrap();
            assert_eq!(outcome, StatusChange::Updated { status, affected: 1 });
            let current = service.get_pending_order(id).await.unwrap().unwrap();
            assert_eq!(current.aggregate.status, status);
        }

        let outcome = service
            .change_status(ChangeStatus::new(id, "received"))
            .await
            .unwrap();
        assert_eq!(outcome, StatusChange::Archived { removed: 1 });
        assert!(
            store
                .find_aggregate(id, Hydration::Bare)
                .await
                .unwrap()
                .is_none()
        );

        // History stays behind for statistics.
        let now = Utc::now();
        let quantity = store
            .quantity_between(
                ProductId::new(7),
                now - Duration::hours(1),
                now + Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(quantity, 3);
        assert_eq!(store.line_item_count().await, 1);
    }

    #[tokio::test]
    async fn jumps_and_backward_moves_are_allowed() {
        let store = seeded_store().await;
        let service = create_service(&store);
        let id = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 1)]))
            .await
            .unwrap()
            .id();

        let outcome = service
            .change_status(ChangeStatus::new(id, "in_transit"))
            .await
            .unwrap();
        assert_eq!(outcome.affected(), 1);
        let outcome = service
            .change_status(ChangeStatus::new(id, "processing"))
            .await
            .unwrap();
        assert_eq!(outcome.affected(), 1);
    }

    #[tokio::test]
    async fn unknown_aggregate_yields_zero_count() {
        let store = seeded_store().await;
        let service = create_service(&store);

        let outcome = service
            .change_status(ChangeStatus::new(common::AggregateId::new(4242), "ready"))
            .await
            .unwrap();
        assert_eq!(outcome.affected(), 0);
    }

    #[tokio::test]
    async fn received_twice_removes_nothing_the_second_time() {
        let store = seeded_store().await;
        let service = create_service(&store);
        let id = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 1)]))
            .await
            .unwrap()
            .id();

        let first = service
            .change_status(ChangeStatus::new(id, "received"))
            .await
            .unwrap();
        let second = service
            .change_status(ChangeStatus::new(id, "received"))
            .await
            .unwrap();
        assert_eq!(first, StatusChange::Archived { removed: 1 });
        assert_eq!(second, StatusChange::Archived { removed: 0 });
    }
}

mod queues {
    use super::*;

    #[tokio::test]
    async fn branch_filter_and_newest_first() {
        let store = seeded_store().await;
        let service = create_service(&store);

        let first = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(7), 1)]))
            .await
            .unwrap();
        let other_branch = Checkout::new(
            UserId::new(1),
            BranchId::new(2),
            PICKUP,
            vec![CheckoutItem::new(ProductId::new(8), 1)],
        );
        let second = service.create_order(other_branch).await.unwrap();
        let third = service
            .create_order(pickup(vec![CheckoutItem::new(ProductId::new(9), 1)]))
            .await
            .unwrap();

        let all = service.list_pending(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![third.id(), second.id(), first.id()]);

        let branch_one = service.list_pending(Some(BranchId::new(1))).await.unwrap();
        let ids: Vec<_> = branch_one.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![third.id(), first.id()]);
    }

    #[tokio::test]
    async fn pending_order_lookup_validates_id() {
        let store = seeded_store().await;
        let service = create_service(&store);

        let err = service
            .get_pending_order(common::AggregateId::new(0))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(
            service
                .get_pending_order(common::AggregateId::new(5))
                .await
                .unwrap()
                .is_none()
        );
    }
}
