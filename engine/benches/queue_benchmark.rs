//! Criterion benchmarks for waiting-room operations.
//!
//! Run with: cargo bench
//! Results saved to: target/criterion/

use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use waitroom::queue::types::{AutoPromotionConfig, QueueStore, RateLimitSettings, RateLimiter, RateScope};
use waitroom::queue::{QueueConfig, QueueManager};

fn filled_store(n: usize) -> QueueStore {
    let mut store = QueueStore::new(n);
    for i in 0..n {
        store.enqueue_at(&format!("client-{i}"), i as u64);
    }
    store
}

/// Benchmark appending to the waiting list.
fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_enqueue");

    for size in [100, 1_000, 10_000] {
        let ids: Vec<String> = (0..size).map(|i| format!("client-{i}")).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.iter(|| {
                let mut store = QueueStore::new(ids.len());
                for id in ids {
                    store.enqueue(id);
                }
                store
            })
        });
    }

    group.finish();
}

/// Benchmark position lookup in the middle and at the back of the line.
fn bench_position(c: &mut Criterion) {
    let store = filled_store(5_000);
    let mut group = c.benchmark_group("store_position");

    group.bench_function("middle", |b| b.iter(|| store.position_of("client-2500")));
    group.bench_function("last", |b| b.iter(|| store.position_of("client-4999")));
    group.bench_function("absent", |b| b.iter(|| store.position_of("nobody")));

    group.finish();
}

/// Benchmark FIFO batch promotion.
fn bench_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_promote");

    for batch in [5, 50, 500] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter_batched(
                || filled_store(5_000),
                |mut store| store.promote_batch(batch),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

/// Benchmark rate-limit checks across many keys.
fn bench_rate_limiter(c: &mut Criterion) {
    let limiter = RateLimiter::new(RateLimitSettings::default());
    let keys: Vec<String> = (0..1_024).map(|i| format!("client-{i}")).collect();
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("rate_limiter");
    group.throughput(Throughput::Elements(1));
    group.bench_function("check", |b| {
        b.iter(|| {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            let key = &keys[(n % keys.len() as u64) as usize];
            limiter.check(key, RateScope::Status, n / 1_000)
        })
    });
    group.finish();
}

/// Benchmark a full join then leave through the manager.
fn bench_join_leave(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = QueueConfig {
        max_queue_size: 100_000,
        auto_approve_threshold: 0,
        auto_promotion: AutoPromotionConfig {
            enabled: false,
            max_concurrent_admitted: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let qm = rt.block_on(async { QueueManager::new(config) });
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("manager");
    group.throughput(Throughput::Elements(1));
    group.bench_function("join_leave", |b| {
        b.to_async(&rt).iter(|| async {
            let id = format!("bench-{}", counter.fetch_add(1, Ordering::Relaxed));
            let ticket = qm.join(&id, None, None).await.unwrap();
            qm.leave(&id);
            ticket
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue,
    bench_position,
    bench_promote,
    bench_rate_limiter,
    bench_join_leave
);
criterion_main!(benches);
