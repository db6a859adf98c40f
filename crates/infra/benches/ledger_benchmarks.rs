use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use hvacdesk_auth::RequestContext;
use hvacdesk_core::{TenantId, UserId};
use hvacdesk_infra::{InMemoryBackend, MovementLedger};
use hvacdesk_inventory::{
    BalanceStrategy, InventoryPolicy, ItemDraft, MovementRequest, StockItemId,
};
use rust_decimal::Decimal;

fn setup(strategy: BalanceStrategy) -> (MovementLedger<Arc<InMemoryBackend>>, RequestContext, StockItemId) {
    let ledger = MovementLedger::new(
        Arc::new(InMemoryBackend::new()),
        InventoryPolicy::default(),
        strategy,
    );
    let ctx = RequestContext::new(TenantId::new(), UserId::new());
    let item = ledger
        .catalog()
        .create(
            &ctx,
            ItemDraft {
                initial_quantity: Decimal::from(1_000),
                ..ItemDraft::named("Bench item")
            },
        )
        .unwrap();
    (ledger, ctx, item.id_typed())
}

fn bench_record_movement(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_movement");
    group.throughput(Throughput::Elements(1));

    for strategy in [
        BalanceStrategy::ReadModifyWrite,
        BalanceStrategy::AtomicIncrement,
        BalanceStrategy::OptimisticVersion { max_retries: 3 },
    ] {
        group.bench_function(strategy.name(), |b| {
            let (ledger, ctx, id) = setup(strategy);
            b.iter(|| {
                black_box(
                    ledger
                        .record(&ctx, MovementRequest::exit(id, black_box(Decimal::ONE)))
                        .unwrap(),
                );
            });
        });
    }

    group.finish();
}

fn bench_history_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_lookup");

    for ledger_size in [10usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("item_history", ledger_size),
            ledger_size,
            |b, &size| {
                let (ledger, ctx, id) = setup(BalanceStrategy::default());
                for _ in 0..size {
                    ledger
                        .record(&ctx, MovementRequest::entry(id, Decimal::ONE))
                        .unwrap();
                }
                b.iter(|| black_box(ledger.history(&ctx, id).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_record_movement, bench_history_lookup);
criterion_main!(benches);
