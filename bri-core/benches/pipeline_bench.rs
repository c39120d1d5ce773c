//! Criterion benchmarks for BRI hot paths.
//!
//! Benchmarks:
//! 1. Percentile ranking (Fenwick vs naive rescan)
//! 2. Moment engine for one horizon
//! 3. Full pipeline run with the default configuration

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bri_core::moments::MomentEngine;
use bri_core::percentile::{percentile_rank, percentile_rank_naive};
use bri_core::returns::{compute_returns, ReturnMethod};
use bri_core::{calculate_full_bri, BriConfig, PriceSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_prices(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let dates = (0..n)
        .map(|i| base_date + chrono::Duration::days(i as i64))
        .collect();
    let prices = (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 * (1.0 + 0.0003 * t) + (t * 0.1).sin() * 10.0 + (t * 0.037).cos() * 4.0
        })
        .collect();
    PriceSeries::new(dates, prices).unwrap()
}

// ── 1. Percentile ranking ───────────────────────────────────────────

fn bench_percentile(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentile_rank");
    let values: Vec<f64> = (0..2520).map(|i| ((i * 7919) % 1009) as f64).collect();

    for &lookback in &[252, 756, 1260] {
        group.bench_with_input(BenchmarkId::new("fenwick", lookback), &lookback, |b, &lb| {
            b.iter(|| percentile_rank(black_box(&values), lb, 0.8));
        });
        group.bench_with_input(BenchmarkId::new("naive", lookback), &lookback, |b, &lb| {
            b.iter(|| percentile_rank_naive(black_box(&values), lb, 0.8));
        });
    }
    group.finish();
}

// ── 2. Moment engine ────────────────────────────────────────────────

fn bench_moments(c: &mut Criterion) {
    let mut group = c.benchmark_group("moment_engine");
    let prices = make_prices(2520);
    let returns = compute_returns(prices.prices(), ReturnMethod::Log).unwrap();

    for &window in &[63, 126, 252] {
        let engine = MomentEngine::new(window, window * 4 / 5, ReturnMethod::Log);
        group.bench_with_input(BenchmarkId::new("window", window), &window, |b, _| {
            b.iter(|| engine.compute(black_box(prices.prices()), black_box(&returns)));
        });
    }
    group.finish();
}

// ── 3. Full pipeline ────────────────────────────────────────────────

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    let config = BriConfig::default();

    for &rows in &[1260, 2520, 5040] {
        let prices = make_prices(rows);
        group.bench_with_input(BenchmarkId::new("default_config", rows), &rows, |b, _| {
            b.iter(|| calculate_full_bri(black_box(&prices), black_box(&config)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_percentile, bench_moments, bench_full_pipeline);
criterion_main!(benches);
