//! Benchmarks for the CLOCK-Pro engines.
//!
//! Run with: `cargo bench --bench record`

use clockpro::config::ClockProConfig;
use clockpro::policy::clock_pro::ClockProPolicy;
use clockpro::policy::three_hand::ThreeHandClockProPolicy;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};

const CAPACITY: usize = 1024;
const OPS: u64 = 4096;

/// Deterministic mixed-locality key stream.
fn next_key(state: &mut u64, space: u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 33) % space
}

// ============================================================================
// Hit path (resident working set, reference-bit updates only)
// ============================================================================

fn bench_hit_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_pro");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("hit_path_lists", |b| {
        b.iter_batched(
            || {
                let mut policy = ClockProPolicy::new(&ClockProConfig::new(CAPACITY)).unwrap();
                for key in 0..CAPACITY as u64 {
                    policy.record(key);
                }
                policy
            },
            |mut policy| {
                let mut state = 7u64;
                for _ in 0..OPS {
                    let key = next_key(&mut state, CAPACITY as u64);
                    policy.record(std::hint::black_box(key));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("hit_path_hands", |b| {
        b.iter_batched(
            || {
                let mut policy =
                    ThreeHandClockProPolicy::new(&ClockProConfig::new(CAPACITY)).unwrap();
                for key in 0..CAPACITY as u64 {
                    policy.record(key);
                }
                policy
            },
            |mut policy| {
                let mut state = 7u64;
                for _ in 0..OPS {
                    let key = next_key(&mut state, CAPACITY as u64);
                    policy.record(std::hint::black_box(key));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// Eviction churn (continuous misses over a key space twice the capacity)
// ============================================================================

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_pro");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("eviction_churn_lists", |b| {
        b.iter_batched(
            || ClockProPolicy::new(&ClockProConfig::new(CAPACITY)).unwrap(),
            |mut policy| {
                let mut state = 11u64;
                for _ in 0..OPS {
                    let key = next_key(&mut state, 2 * CAPACITY as u64);
                    policy.record(std::hint::black_box(key));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("eviction_churn_hands", |b| {
        b.iter_batched(
            || ThreeHandClockProPolicy::new(&ClockProConfig::new(CAPACITY)).unwrap(),
            |mut policy| {
                let mut state = 11u64;
                for _ in 0..OPS {
                    let key = next_key(&mut state, 2 * CAPACITY as u64);
                    policy.record(std::hint::black_box(key));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_hit_path, bench_eviction_churn);
criterion_main!(benches);
