use common::{BranchId, OperatorId, PaymentTypeId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{ChangeStatus, Checkout, CheckoutItem, Money, OrderLifecycle};
use notifications::SessionHub;
use order_store::{InMemoryStore, Operator, Product};

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_branch(BranchId::new(1)).await;
    store.add_operator(Operator::global(OperatorId::new(1))).await;
    for id in 1..=5 {
        store
            .add_product(Product {
                id: ProductId::new(id),
                name: format!("product-{id}"),
                price: Money::from_cents(100 * id),
            })
            .await;
    }
    store
}

fn checkout() -> Checkout {
    Checkout::new(
        UserId::new(1),
        BranchId::new(1),
        PaymentTypeId::new(2),
        (1..=5)
            .map(|id| CheckoutItem::new(ProductId::new(id), id))
            .collect(),
    )
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let hub = SessionHub::new();
    let _session = hub.register(OperatorId::new(1));
    let service = OrderLifecycle::new(store, hub);

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.create_order(checkout()).await.unwrap();
            });
        });
    });
}

fn bench_create_and_receive(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let service = OrderLifecycle::new(store, SessionHub::new());

    c.bench_function("domain/create_then_receive", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = service.create_order(checkout()).await.unwrap();
                service
                    .change_status(ChangeStatus::new(order.id(), "received"))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_create_order, bench_create_and_receive);
criterion_main!(benches);
