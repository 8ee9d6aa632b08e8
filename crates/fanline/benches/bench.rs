use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use fanline::{Pipeline, PipelineConfig, primes};
use std::time::Instant;
use tokio::runtime::Builder;

// Number of primes collected per benchmark iteration.
const TAKE: usize = 256;

/// Benchmarks prime search throughput for growing worker pools.
fn bench_prime_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("prime_pipeline");
    group.sample_size(10);
    group.sampling_mode(criterion::SamplingMode::Flat);
    group.throughput(Throughput::Elements(TAKE as u64));

    let max_workers = num_cpus::get().max(1);
    let mut workers = 1;
    while workers <= max_workers {
        let rt = Builder::new_multi_thread()
            .worker_threads(workers)
            .enable_time()
            .build()
            .unwrap();

        group.bench_function(format!("elems/{TAKE}/workers/{workers}"), |b| {
            b.to_async(&rt).iter_custom(move |iters| async move {
                let start = Instant::now();

                for _ in 0..iters {
                    let config = PipelineConfig::new(TAKE).with_parallelism(workers);
                    let found = Pipeline::new(config)
                        .unwrap()
                        .run(primes::random_candidates(primes::DEFAULT_UPPER_BOUND), |n| {
                            primes::is_prime(*n)
                        })
                        .await;
                    black_box(found);
                }

                start.elapsed()
            });
        });

        workers *= 2;
    }

    group.finish();
}

/// Benchmarks the handoff overhead alone with a predicate that keeps every
/// value.
fn bench_passthrough(c: &mut Criterion) {
    let mut group = c.benchmark_group("passthrough");
    group.throughput(Throughput::Elements(TAKE as u64));

    let rt = Builder::new_multi_thread().enable_time().build().unwrap();

    for workers in [1, 2, 4, 8] {
        group.bench_function(format!("elems/{TAKE}/workers/{workers}"), |b| {
            b.to_async(&rt).iter_custom(move |iters| async move {
                let start = Instant::now();

                for _ in 0..iters {
                    let config = PipelineConfig::new(TAKE).with_parallelism(workers);
                    let found = Pipeline::new(config).unwrap().run(|| 1_u64, |_| true).await;
                    black_box(found);
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prime_pipeline, bench_passthrough);
criterion_main!(benches);
