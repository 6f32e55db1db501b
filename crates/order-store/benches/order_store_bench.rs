use chrono::Utc;
use common::{Money, OrderStatus};
use criterion::{Criterion, criterion_group, criterion_main};
use order_store::{
    BranchId, InMemoryStore, NewAggregate, NewLineItem, NewOrder, OrderStore, PaymentTypeId,
    PendingFilter, ProductId, UserId,
};

fn make_order(branch: i64) -> NewOrder {
    NewOrder {
        aggregate: NewAggregate {
            user_id: UserId::new(1),
            branch_id: BranchId::new(branch),
            payment_type_id: PaymentTypeId::new(2),
            address: None,
            message: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        },
        line_items: (1..=3)
            .map(|p| NewLineItem::new(ProductId::new(p), 2, Money::from_cents(500), Utc::now()))
            .collect(),
    }
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();

    c.bench_function("order_store/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.place_order(make_order(1)).await.unwrap();
            });
        });
    });
}

fn bench_list_pending(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(async {
        for i in 0..1_000 {
            store.place_order(make_order(i % 10 + 1)).await.unwrap();
        }
    });

    c.bench_function("order_store/list_pending_branch_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .list_pending(PendingFilter::new().branch_id(BranchId::new(3)))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_place_order, bench_list_pending);
criterion_main!(benches);
