//! 메트릭 집계기 벤치마크
//!
//! 키 분포에 따른 observe/drain 처리량을 측정합니다.

use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use bucketstat_core::types::Unit;
use bucketstat_pipeline::aggregate::MetricAggregator;
use bucketstat_pipeline::rule::Measurement;

fn measurements(unique_keys: usize, total: usize) -> Vec<Measurement> {
    let base = Utc.with_ymd_and_hms(2019, 2, 6, 0, 0, 0).unwrap();
    (0..total)
        .map(|i| Measurement {
            metric_name: format!("AllRequests_Metric{}", i % unique_keys),
            bucket: base + Duration::minutes((i % unique_keys) as i64),
            unit: Unit::Milliseconds,
            value: (i % 500) as f64,
        })
        .collect()
}

fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator_observe");
    group.throughput(Throughput::Elements(10_000));

    // 키가 적으면 대부분 병합 경로
    let few_keys = measurements(16, 10_000);
    group.bench_function("10k_obs_16_keys", |b| {
        b.iter(|| {
            let mut aggregator = MetricAggregator::new();
            for m in &few_keys {
                aggregator.observe(black_box(m));
            }
            aggregator
        })
    });

    // 키가 많으면 대부분 삽입 경로
    let many_keys = measurements(2_000, 10_000);
    group.bench_function("10k_obs_2000_keys", |b| {
        b.iter(|| {
            let mut aggregator = MetricAggregator::new();
            for m in &many_keys {
                aggregator.observe(black_box(m));
            }
            aggregator
        })
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator_drain");
    let source = measurements(2_000, 10_000);

    group.throughput(Throughput::Elements(2_000));
    group.bench_function("drain_2000_keys", |b| {
        b.iter_batched(
            || {
                let mut aggregator = MetricAggregator::new();
                for m in &source {
                    aggregator.observe(m);
                }
                aggregator
            },
            |mut aggregator| black_box(aggregator.drain()),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_observe, bench_drain);
criterion_main!(benches);
