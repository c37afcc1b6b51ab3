//! Hammers a single gate from many concurrent tasks and prints once per interval.
//!
//! ```text
//! cargo run --release -p once-every --example stress -- --callers 1000000 --duration 5s
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;

use clap::Parser;
use hdrhistogram::Histogram;
use once_every::Attempt;
use once_every::IntervalGate;
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Latencies are recorded into a fixed set of histograms so memory stays flat
// however many calls are made.
const LATENCY_SHARDS: usize = 64;

#[derive(Parser, Debug)]
#[command(about = "Stress an IntervalGate with concurrent callers")]
struct Args {
    /// Minimum spacing between two runs of the action.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Number of concurrent tasks.
    #[arg(long, default_value_t = 100_000)]
    callers: usize,

    /// How long the run lasts once every task is released.
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    duration: Duration,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let gate = match IntervalGate::new(args.interval) {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            eprintln!("invalid interval: {e}");
            std::process::exit(2);
        }
    };
    let runs = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(args.callers));
    let started = Arc::new(OnceLock::new());
    let shards: Arc<Vec<Mutex<Histogram<u64>>>> = Arc::new(
        (0..LATENCY_SHARDS)
            .map(|_| Mutex::new(latency_histogram()))
            .collect(),
    );

    info!(
        interval = ?args.interval,
        callers = args.callers,
        duration = ?args.duration,
        "starting stress test"
    );

    let mut tasks = JoinSet::new();
    for i in 0..args.callers {
        let gate = gate.clone();
        let runs = runs.clone();
        let bar = barrier.clone();
        let started = started.clone();
        let shards = shards.clone();
        let duration = args.duration;
        tasks.spawn(async move {
            bar.wait().await;
            // Every task shares the deadline of whichever task woke first.
            let deadline = *started.get_or_init(Instant::now) + duration;
            let shard = &shards[i % LATENCY_SHARDS];
            let mut throttled = 0usize;

            while Instant::now() < deadline {
                let call_start = Instant::now();
                let res = gate.attempt(|| {
                    let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
                    let secs = SystemTime::now()
                        .duration_since(SystemTime::UNIX_EPOCH)
                        .map(|d| d.as_secs_f64())
                        .unwrap_or_default();
                    println!("Only once this interval: run {n} at {secs:.3}");
                    Ok::<(), std::io::Error>(())
                });
                let nanos = u64::try_from(call_start.elapsed().as_nanos()).unwrap_or(u64::MAX);
                shard.lock().unwrap().saturating_record(nanos);
                if matches!(res, Ok(Attempt::Throttled { .. })) {
                    throttled += 1;
                }
                tokio::task::yield_now().await;
            }
            throttled
        });
    }

    let mut throttled = 0;
    while let Some(task) = tasks.join_next().await {
        throttled += task.expect("Task panicked");
    }
    let elapsed = started.get().map(|s| s.elapsed()).unwrap_or_default();

    let mut hist = latency_histogram();
    for shard in shards.iter() {
        hist.add(&*shard.lock().unwrap()).unwrap();
    }

    let runs = runs.load(Ordering::SeqCst);
    let windows = (elapsed.as_nanos() / args.interval.as_nanos()) + 1;

    println!("\n--- Results ---");
    println!("Elapsed:          {elapsed:?}");
    println!("Action runs:      {runs} (at most {windows} expected)");
    println!("Throttled calls:  {throttled}");
    println!("Total calls:      {}", hist.len());
    println!("p50 latency:      {}ns", hist.value_at_quantile(0.5));
    println!("p99 latency:      {}ns", hist.value_at_quantile(0.99));
    println!("max latency:      {}ns", hist.max());
}

fn latency_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).unwrap()
}
