//! Bar-by-bar backtesting engine.
//!
//! [`BacktestEngine`] replays one [`barsim_core::BarSeries`] against one
//! strategy, keeping cash and the single open position in a [`Ledger`].
//! [`ParamSweep`] fans independent runs out over a parameter grid.

mod engine;
mod ledger;
mod report;
mod statistics;
mod sweep;

pub use engine::{run_backtest, BacktestConfig, BacktestEngine};
pub use ledger::Ledger;
pub use report::{BacktestResults, EquityRow, MetricsRecord, RejectedIntent, RunMetadata, TradeRow};
pub use statistics::{compute_metrics, infer_periods_per_year, PerformanceMetrics, ProfitFactor};
pub use sweep::{ParamGrid, ParamSweep, RankBy, SweepEntry, SweepFailure, SweepResults};
