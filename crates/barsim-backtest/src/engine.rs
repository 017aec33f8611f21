//! Backtesting engine.

use barsim_core::{
    BacktestError, Bar, BarContext, BarSeries, EquityPoint, ExecutionTiming, OrderIntent,
    Strategy,
};
use barsim_indicators::IndicatorSet;
use barsim_strategies::StrategyParams;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ledger::Ledger;
use crate::report::{BacktestResults, RejectedIntent, RunMetadata};
use crate::statistics::compute_metrics;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_cash: f64,
    /// Commission as a fraction of traded notional, charged on entry and exit
    pub commission_rate: f64,
    /// Price at which intents are filled
    pub execution: ExecutionTiming,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            commission_rate: 0.002,
            execution: ExecutionTiming::SameBarClose,
        }
    }
}

impl BacktestConfig {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            initial_cash,
            commission_rate,
            ..Default::default()
        }
    }

    pub fn with_execution(mut self, execution: ExecutionTiming) -> Self {
        self.execution = execution;
        self
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(BacktestError::Config(format!(
                "initial cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(BacktestError::Config(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

/// Backtesting engine.
///
/// Replays a series bar by bar against one strategy. A run is sequential and
/// owns all of its state, so one engine can serve many runs concurrently.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest.
    ///
    /// Returns complete results or a single error; ledger rejections during
    /// the run are recorded in the results rather than aborting it.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        series: &BarSeries,
    ) -> Result<BacktestResults, BacktestError> {
        self.config.validate()?;
        series.validate()?;

        let bars = series.bars();
        let indicators = IndicatorSet::compute(&strategy.indicators(), &series.closes())?;

        info!(
            symbol = %series.symbol,
            timeframe = %series.timeframe,
            strategy = strategy.name(),
            bars = bars.len(),
            execution = %self.config.execution,
            "Starting backtest"
        );

        let mut sim = Simulation {
            ledger: Ledger::new(self.config.initial_cash),
            commission_rate: self.config.commission_rate,
            rejected: Vec::new(),
        };
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut suppressed_bars = 0;
        let mut pending: Option<(usize, OrderIntent)> = None;

        for (i, bar) in bars.iter().enumerate() {
            if let Some((signal_bar, intent)) = pending.take() {
                sim.apply(signal_bar, i, bar, bar.open, intent);
            }

            if indicators.all_defined_at(i) {
                let values = indicators.values_at(i);
                let ctx = BarContext {
                    index: i,
                    bar,
                    indicators: &values,
                    position: sim.ledger.position(),
                };

                if let Some(intent) = strategy.evaluate(&ctx) {
                    match self.config.execution {
                        ExecutionTiming::SameBarClose => sim.apply(i, i, bar, bar.close, intent),
                        ExecutionTiming::NextBarOpen => pending = Some((i, intent)),
                    }
                }
            } else {
                suppressed_bars += 1;
            }

            equity_curve.push(EquityPoint {
                bar_index: i,
                timestamp: bar.timestamp,
                equity: sim.ledger.mark_to_market(bar.close),
            });
        }

        if let Some((signal_bar, intent)) = pending {
            sim.reject(signal_bar, intent, "end of data before fill".to_string());
        }

        if let Some(last) = bars.last() {
            let last_index = bars.len() - 1;
            if let Ok(trade) = sim.ledger.force_close(
                last_index,
                last.timestamp,
                last.close,
                self.config.commission_rate,
            ) {
                debug!(pnl = trade.pnl, price = last.close, "Force-closed open position at end of data");
                let realized = sim.ledger.cash();
                if let Some(point) = equity_curve.last_mut() {
                    point.equity = realized;
                }
            }
        }

        let Simulation { ledger, rejected, .. } = sim;
        let trades = ledger.into_trades();

        let mut metrics = compute_metrics(self.config.initial_cash, &equity_curve, &trades);
        metrics.buy_hold_return_pct = buy_and_hold_pct(bars);

        info!(
            trades = trades.len(),
            rejected = rejected.len(),
            suppressed = suppressed_bars,
            return_pct = format!("{:.2}", metrics.return_pct),
            "Backtest complete"
        );

        Ok(BacktestResults {
            metadata: RunMetadata {
                symbol: series.symbol.clone(),
                timeframe: series.timeframe,
                strategy: strategy.name().to_string(),
                strategy_params: strategy.params(),
                initial_cash: self.config.initial_cash,
                commission_rate: self.config.commission_rate,
                execution: self.config.execution,
                bars: bars.len(),
                warmup_bars: strategy.warmup_period(),
                suppressed_bars,
            },
            metrics,
            equity_curve,
            trades,
            rejected_intents: rejected,
        })
    }
}

/// Run `params` over `series` with same-bar-close execution.
pub fn run_backtest(
    series: &BarSeries,
    params: &StrategyParams,
    initial_cash: f64,
    commission_rate: f64,
) -> Result<BacktestResults, BacktestError> {
    let strategy = params.build()?;
    BacktestEngine::new(BacktestConfig::new(initial_cash, commission_rate))
        .run(strategy.as_ref(), series)
}

/// Per-run mutable state.
struct Simulation {
    ledger: Ledger,
    commission_rate: f64,
    rejected: Vec<RejectedIntent>,
}

impl Simulation {
    fn apply(&mut self, signal_bar: usize, fill_bar: usize, bar: &Bar, price: f64, intent: OrderIntent) {
        let outcome = match intent {
            OrderIntent::Open { side, fraction } => self
                .ledger
                .open(fill_bar, bar.timestamp, side, price, fraction, self.commission_rate)
                .map(|pos| debug!(bar = fill_bar, %side, size = pos.size, price, "Opened position")),
            OrderIntent::Close => self
                .ledger
                .close(fill_bar, bar.timestamp, price, self.commission_rate)
                .map(|trade| debug!(bar = fill_bar, pnl = trade.pnl, price, "Closed position")),
        };

        if let Err(err) = outcome {
            self.reject(signal_bar, intent, err.to_string());
        }
    }

    fn reject(&mut self, bar_index: usize, intent: OrderIntent, reason: String) {
        warn!(bar = bar_index, %intent, %reason, "Rejected order intent");
        self.rejected.push(RejectedIntent {
            bar_index,
            intent,
            reason,
        });
    }
}

fn buy_and_hold_pct(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if first.close > 0.0 => (last.close / first.close - 1.0) * 100.0,
        _ => 0.0,
    }
}
