//! End-to-end backtest scenarios on synthetic series.

use approx::assert_relative_eq;
use barsim_backtest::{run_backtest, BacktestConfig, BacktestEngine, ProfitFactor};
use barsim_core::{
    BacktestError, Bar, BarContext, BarSeries, IndicatorSpec, OrderIntent, Strategy, Timeframe,
};
use barsim_strategies::{MACrossoverConfig, RsiSmaConfig, StrategyParams};

const DAY: i64 = 86_400_000;

fn series_from(closes: impl IntoIterator<Item = f64>) -> BarSeries {
    let bars = closes
        .into_iter()
        .enumerate()
        .map(|(i, c)| Bar::new(i as i64 * DAY, c, c * 1.01, c * 0.99, c, 1_000_000.0))
        .collect();
    BarSeries::from_bars("SYN", Timeframe::Daily, bars)
}

fn flat(n: usize) -> BarSeries {
    series_from(std::iter::repeat(100.0).take(n))
}

fn rising(n: usize) -> BarSeries {
    series_from((0..n).map(|i| 100.0 + i as f64))
}

#[test]
fn flat_series_makes_no_trades() {
    let results = run_backtest(&flat(300), &StrategyParams::default(), 1_000_000.0, 0.002).unwrap();

    assert!(results.trades.is_empty());
    assert_eq!(results.metrics.return_pct, 0.0);
    assert_eq!(results.metrics.max_drawdown_pct, 0.0);
    assert_eq!(results.metrics.sharpe_ratio, 0.0);
    assert_eq!(results.metrics.win_rate_pct, 0.0);
    assert_eq!(results.metrics.profit_factor, ProfitFactor::Undefined);
    assert_eq!(results.equity_curve.len(), 300);
    // SMA 200 needs 199 bars of warm-up
    assert_eq!(results.metadata.suppressed_bars, 199);
}

#[test]
fn rising_series_holds_one_trade_to_the_end() {
    let params = StrategyParams::MaCrossover(MACrossoverConfig::default());
    let results = run_backtest(&rising(300), &params, 1_000_000.0, 0.002).unwrap();

    assert_eq!(results.trades.len(), 1);
    let trade = &results.trades[0];
    assert!(trade.forced_exit);
    assert_eq!(trade.exit_bar, 299);
    assert!(results.metrics.return_pct > 0.0);
    assert_eq!(results.metrics.profit_factor, ProfitFactor::NoLosses);
    assert_eq!(results.metrics.win_rate_pct, 100.0);
}

#[test]
fn rsi_sma_never_enters_a_monotonic_rally() {
    // RSI stays pinned at 100, never oversold
    let results = run_backtest(&rising(300), &StrategyParams::default(), 1_000_000.0, 0.002).unwrap();
    assert!(results.trades.is_empty());
    assert_eq!(results.metrics.return_pct, 0.0);
}

#[test]
fn rsi_sma_buys_a_dip_in_an_uptrend() {
    // long uptrend, a sharp three-bar dip, then recovery
    let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
    closes.extend([150.0, 140.0, 130.0]);
    closes.extend((0..40).map(|i| 132.0 + 3.0 * i as f64));

    let params = StrategyParams::RsiSma(RsiSmaConfig {
        rsi_period: 5,
        sma_fast: 5,
        sma_slow: 20,
        ..Default::default()
    });
    let results = run_backtest(&series_from(closes), &params, 100_000.0, 0.0).unwrap();

    assert!(!results.trades.is_empty());
    let first = &results.trades[0];
    assert!(first.entry_bar >= 60 && first.entry_bar <= 62);
    assert!(first.pnl > 0.0);
}

#[test]
fn empty_series_is_no_data() {
    let empty = BarSeries::new("SYN", Timeframe::Daily);
    let err = run_backtest(&empty, &StrategyParams::default(), 1_000_000.0, 0.002).unwrap_err();
    assert!(matches!(err, BacktestError::NoData(_)));
}

#[test]
fn invalid_params_fail_before_the_run() {
    let params = StrategyParams::RsiSma(RsiSmaConfig {
        size: 1.5,
        ..Default::default()
    });
    let err = run_backtest(&rising(50), &params, 1_000_000.0, 0.002).unwrap_err();
    assert!(matches!(err, BacktestError::Strategy(_)));
}

/// Asks for 150% of cash on the first defined bar, then 50% on the next.
struct Oversized;

impl Strategy for Oversized {
    fn name(&self) -> &str {
        "oversized"
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        vec![IndicatorSpec::sma("ma", 3)]
    }

    fn evaluate(&self, ctx: &BarContext<'_>) -> Option<OrderIntent> {
        match ctx.index {
            2 => Some(OrderIntent::buy(1.5)),
            3 if ctx.is_flat() => Some(OrderIntent::buy(0.5)),
            _ => None,
        }
    }

    fn params(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

#[test]
fn oversized_fraction_is_rejected_and_run_continues() {
    let engine = BacktestEngine::new(BacktestConfig::new(10_000.0, 0.0));
    let results = engine.run(&Oversized, &rising(10)).unwrap();

    assert_eq!(results.rejected_intents.len(), 1);
    assert_eq!(results.rejected_intents[0].bar_index, 2);
    assert_eq!(results.equity_curve.len(), 10);

    assert_eq!(results.trades.len(), 1);
    let trade = &results.trades[0];
    assert_eq!(trade.entry_bar, 3);
    // 10_000 * 0.5 / 103 -> 48 units
    assert_eq!(trade.size, 48.0);
    assert_relative_eq!(trade.pnl, 48.0 * (109.0 - 103.0));
}

#[test]
fn results_round_trip_through_json_export() {
    let params = StrategyParams::MaCrossover(MACrossoverConfig::default());
    let results = run_backtest(&rising(120), &params, 1_000_000.0, 0.002).unwrap();

    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    assert_eq!(json["metadata"]["execution"], "same_bar_close");
    assert_eq!(json["metrics"]["# Trades"], 1);
    assert_eq!(json["equity_curve"].as_array().unwrap().len(), 120);
    assert_eq!(json["trades"][0]["ForcedExit"], true);
}
