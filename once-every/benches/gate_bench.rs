use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use once_every::IntervalGate;

fn noop() -> Result<(), ()> {
    Ok(())
}

fn bench_fast_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("FastPath");

    // A long interval keeps every iteration after the first on the lock-free path.
    let gate = IntervalGate::new(Duration::from_secs(3600)).unwrap();
    let _ = gate.attempt_once(noop);

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(&gate).attempt_once(noop);
        })
    });

    group.finish();
}

fn bench_slow_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("SlowPath");

    // A failing action never closes the window, so every call takes the lock.
    let gate = IntervalGate::new(Duration::from_secs(3600)).unwrap();

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(&gate).attempt_once(|| Err::<(), ()>(()));
        })
    });

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parallel");

    for (name, interval) in [
        ("spent-window", Duration::from_secs(3600)),
        ("1us-window", Duration::from_micros(1)),
    ] {
        let gate = Arc::new(IntervalGate::new(interval).unwrap());

        for threads in [2, 4, 8].iter() {
            let num_threads = *threads;
            group.bench_with_input(
                BenchmarkId::new(name, format!("{}-threads", num_threads)),
                &num_threads,
                |b, &n| {
                    b.iter_custom(|iters| {
                        let barrier = Arc::new(Barrier::new(n + 1));
                        let mut handles = Vec::with_capacity(n);

                        for _ in 0..n {
                            let g = Arc::clone(&gate);
                            let bar = Arc::clone(&barrier);
                            let iters_per_thread = iters / n as u64;

                            handles.push(thread::spawn(move || {
                                bar.wait();
                                for _ in 0..iters_per_thread {
                                    let _ = black_box(g.attempt_once(noop));
                                }
                            }));
                        }

                        barrier.wait();
                        let start = Instant::now();

                        for handle in handles {
                            let _ = handle.join();
                        }

                        start.elapsed()
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_fast_path, bench_slow_path, bench_parallel);
criterion_main!(benches);
