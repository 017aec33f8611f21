//! Benchmarks for full simulation runs.

use barsim_backtest::{BacktestConfig, BacktestEngine, ParamGrid, ParamSweep};
use barsim_core::{Bar, BarSeries, Timeframe};
use barsim_strategies::{MACrossoverConfig, StrategyParams};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_series(size: usize) -> BarSeries {
    let bars = (0..size)
        .map(|i| {
            let c = 100.0 + (i as f64 * 0.05).sin() * 15.0 + (i as f64 * 0.31).cos() * 3.0;
            Bar::new(i as i64 * 86_400_000, c, c * 1.01, c * 0.99, c, 1_000_000.0)
        })
        .collect();
    BarSeries::from_bars("BENCH", Timeframe::Daily, bars)
}

fn benchmark_single_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("BacktestRun");
    let engine = BacktestEngine::new(BacktestConfig::default());

    for size in [1_000, 10_000, 100_000] {
        let series = generate_series(size);

        for params in [
            StrategyParams::default(),
            StrategyParams::MaCrossover(MACrossoverConfig::default()),
        ] {
            let strategy = params.build().unwrap();
            group.bench_with_input(BenchmarkId::new(params.key(), size), &series, |b, series| {
                b.iter(|| engine.run(strategy.as_ref(), black_box(series)).unwrap())
            });
        }
    }

    group.finish();
}

fn benchmark_sweep(c: &mut Criterion) {
    let series = generate_series(5_000);
    let grid = ParamGrid::new(StrategyParams::MaCrossover(MACrossoverConfig::default()))
        .axis("fast_period", [5, 10, 15, 20])
        .axis("slow_period", [30, 50, 100, 200]);

    c.bench_function("sweep_16_parallel", |b| {
        let sweep = ParamSweep::new(BacktestConfig::default());
        b.iter(|| sweep.run(&grid, black_box(&series), None).unwrap())
    });

    c.bench_function("sweep_16_sequential", |b| {
        let sweep = ParamSweep::new(BacktestConfig::default()).with_parallelism(false);
        b.iter(|| sweep.run(&grid, black_box(&series), None).unwrap())
    });
}

criterion_group!(benches, benchmark_single_run, benchmark_sweep);
criterion_main!(benches);
