mod config;

use anyhow::Context;
use clock::{Clock, ClockKind};
use hdrhistogram::Histogram;
use serde::Serialize;
use std::hint::black_box;
use std::time::Instant;

/// Single reads are a few nanoseconds, below timer resolution; they are
/// measured in blocks and reported per read.
const READS_PER_SAMPLE: u64 = 1_000;

fn bench_raw_reads(clock: &Clock, iterations: u64) -> Histogram<u64> {
    let mut hist = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).unwrap();
    let samples = (iterations / READS_PER_SAMPLE).max(1);

    println!(
        "Running Raw Read Benchmark ({} samples x {} reads)...",
        samples, READS_PER_SAMPLE
    );

    let mut sink: u64 = 0;
    for _ in 0..samples {
        let start = Instant::now();
        for _ in 0..READS_PER_SAMPLE {
            sink = sink.wrapping_add(clock.raw_now_ns());
        }
        let elapsed = start.elapsed().as_nanos() as u64;
        hist.record((elapsed / READS_PER_SAMPLE).max(1)).unwrap();
    }
    black_box(sink);
    hist
}

fn bench_cached_reads(clock: &Clock, iterations: u64) -> Histogram<u64> {
    let mut hist = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).unwrap();
    let samples = (iterations / READS_PER_SAMPLE).max(1);

    println!(
        "Running Cached Read Benchmark ({} samples x {} reads)...",
        samples, READS_PER_SAMPLE
    );

    let mut sink: u64 = 0;
    for _ in 0..samples {
        let start = Instant::now();
        for _ in 0..READS_PER_SAMPLE {
            sink = sink.wrapping_add(clock.cached_ns());
        }
        let elapsed = start.elapsed().as_nanos() as u64;
        hist.record((elapsed / READS_PER_SAMPLE).max(1)).unwrap();
    }
    black_box(sink);
    hist
}

fn bench_refresh(clock: &mut Clock, iterations: u64) -> Histogram<u64> {
    let mut hist = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).unwrap();

    println!("Running Refresh Benchmark ({} iterations)...", iterations);

    for _ in 0..iterations {
        let start = Instant::now();
        black_box(clock.refresh());
        let elapsed = start.elapsed().as_nanos() as u64;
        hist.record(elapsed.max(1)).unwrap();
    }
    hist
}

/// The usage pattern the clock exists for: one refresh per batch, then only
/// cache reads and integer arithmetic. Reported per batch.
fn bench_batch(clock: &mut Clock, run: &config::RunConfig) -> anyhow::Result<Histogram<u64>> {
    let mut hist = Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).unwrap();
    let batch_size = run.batch_size.max(1);
    let batches = (run.iterations / batch_size).max(1);

    println!(
        "Running Batch Benchmark ({} batches x {} expiry checks)...",
        batches, batch_size
    );

    let mut due: u64 = 0;
    let mut pending: u64 = 0;
    for _ in 0..batches {
        let start = Instant::now();

        clock.refresh();
        let horizon = clock.deadline_after(run.horizon_secs)?;
        let step = clock.remaining_ns(horizon) / batch_size;

        for i in 0..batch_size {
            let deadline = clock.deadline_in_ns(i * step);
            if clock.is_expired(deadline) {
                due += 1;
            } else {
                pending += 1;
            }
        }

        let elapsed = start.elapsed().as_nanos() as u64;
        hist.record(elapsed.max(1)).unwrap();
    }

    tracing::debug!(due, pending, "batch benchmark deadline tally");
    Ok(hist)
}

fn print_stats(name: &str, hist: &Histogram<u64>) {
    println!("\n--- {} (ns) ---", name);
    println!("Samples: {}", hist.len());
    println!("Min:     {}", hist.min());
    println!("p50:     {}", hist.value_at_quantile(0.50));
    println!("p95:     {}", hist.value_at_quantile(0.95));
    println!("p99:     {}", hist.value_at_quantile(0.99));
    println!("Max:     {}", hist.max());
    println!("Mean:    {:.2}", hist.mean());
}

#[derive(Serialize)]
struct Summary {
    run_at: String,
    clock_kind: String,
    iterations: u64,
    batch_size: u64,
    horizon_secs: f64,
    final_generation: u64,
    clock_uptime_secs: f64,
    raw_read_p50_ns: u64,
    raw_read_p99_ns: u64,
    cached_read_p50_ns: u64,
    cached_read_p99_ns: u64,
    refresh_p50_ns: u64,
    refresh_p99_ns: u64,
    batch_p50_ns: u64,
    batch_p99_ns: u64,
}

fn main() -> anyhow::Result<()> {
    let cfg = config::load("bench.toml")?;

    let _guard = telemetry::init("./logs").context("Failed to initialize telemetry")?;

    let kind: ClockKind = cfg
        .clock
        .kind
        .parse()
        .with_context(|| format!("Bad [clock] kind in bench.toml: {:?}", cfg.clock.kind))?;

    tracing::info!(
        kind = %cfg.clock.kind,
        iterations = cfg.run.iterations,
        batch_size = cfg.run.batch_size,
        "starting clock benchmark"
    );

    let mut clock = Clock::new(kind);

    let raw_hist = bench_raw_reads(&clock, cfg.run.iterations);
    print_stats("Raw Monotonic Read", &raw_hist);

    let cached_hist = bench_cached_reads(&clock, cfg.run.iterations);
    print_stats("Cached Read", &cached_hist);

    let refresh_hist = bench_refresh(&mut clock, cfg.run.iterations);
    print_stats("Refresh", &refresh_hist);

    let batch_hist = bench_batch(&mut clock, &cfg.run)?;
    print_stats("Batch (refresh + expiry checks)", &batch_hist);

    let summary = Summary {
        run_at: chrono::Utc::now().to_rfc3339(),
        clock_kind: cfg.clock.kind.clone(),
        iterations: cfg.run.iterations,
        batch_size: cfg.run.batch_size,
        horizon_secs: cfg.run.horizon_secs,
        final_generation: clock.generation(),
        clock_uptime_secs: clock.cached_seconds(),
        raw_read_p50_ns: raw_hist.value_at_quantile(0.50),
        raw_read_p99_ns: raw_hist.value_at_quantile(0.99),
        cached_read_p50_ns: cached_hist.value_at_quantile(0.50),
        cached_read_p99_ns: cached_hist.value_at_quantile(0.99),
        refresh_p50_ns: refresh_hist.value_at_quantile(0.50),
        refresh_p99_ns: refresh_hist.value_at_quantile(0.99),
        batch_p50_ns: batch_hist.value_at_quantile(0.50),
        batch_p99_ns: batch_hist.value_at_quantile(0.99),
    };

    println!("\n{}", serde_json::to_string(&summary)?);

    Ok(())
}
