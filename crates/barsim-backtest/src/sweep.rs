//! Parameter sweeps over a grid of strategy configurations.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use barsim_core::{BacktestError, BarSeries, StrategyError};
use barsim_strategies::StrategyParams;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::{BacktestConfig, BacktestEngine};
use crate::statistics::PerformanceMetrics;

/// Cartesian grid over the fields of one strategy variant.
///
/// Axes name fields of the base parameter set; every combination is merged
/// into the base and validated. Invalid combinations (e.g. a fast period not
/// below the slow one) are dropped before any run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub base: StrategyParams,
    pub axes: Vec<(String, Vec<serde_json::Value>)>,
}

impl ParamGrid {
    pub fn new(base: StrategyParams) -> Self {
        Self {
            base,
            axes: Vec::new(),
        }
    }

    /// Add an axis of values for field `name`.
    pub fn axis<T: Into<serde_json::Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.axes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Number of combinations before validation.
    pub fn size(&self) -> usize {
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    /// Expand the grid into validated parameter sets.
    ///
    /// Returns the valid combinations and the number that failed validation.
    /// An axis naming a field the variant does not have is an error.
    pub fn generate(&self) -> Result<(Vec<StrategyParams>, usize), StrategyError> {
        let base = serde_json::to_value(&self.base)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        let serde_json::Value::Object(base) = base else {
            return Err(StrategyError::InvalidConfig(
                "strategy parameters must be an object".into(),
            ));
        };

        for (name, _) in &self.axes {
            if name == "strategy" || !base.contains_key(name) {
                return Err(StrategyError::InvalidConfig(format!(
                    "unknown parameter '{}' for {}",
                    name,
                    self.base.key()
                )));
            }
        }

        let mut combos = vec![base];
        for (name, values) in &self.axes {
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    values.iter().map(move |v| {
                        let mut next = combo.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }

        let mut valid = Vec::with_capacity(combos.len());
        let mut invalid = 0;
        for combo in combos {
            let parsed = serde_json::from_value::<StrategyParams>(serde_json::Value::Object(combo))
                .map_err(|e| StrategyError::InvalidConfig(e.to_string()))
                .and_then(|p| p.validate().map(|_| p));
            match parsed {
                Ok(params) => valid.push(params),
                Err(err) => {
                    debug!(error = %err, "Skipping invalid grid combination");
                    invalid += 1;
                }
            }
        }

        Ok((valid, invalid))
    }
}

/// Metric used to rank sweep entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    Return,
    #[default]
    Sharpe,
    Sortino,
    Calmar,
    WinRate,
    ProfitFactor,
    /// Smallest drawdown first
    MaxDrawdown,
}

impl RankBy {
    /// Score where larger is better.
    fn score(&self, m: &PerformanceMetrics) -> f64 {
        let score = match self {
            RankBy::Return => m.return_pct,
            RankBy::Sharpe => m.sharpe_ratio,
            RankBy::Sortino => m.sortino_ratio,
            RankBy::Calmar => m.calmar_ratio,
            RankBy::WinRate => m.win_rate_pct,
            RankBy::ProfitFactor => m.profit_factor.as_f64(),
            RankBy::MaxDrawdown => -m.max_drawdown_pct,
        };
        if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        }
    }
}

impl FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "return" => Ok(RankBy::Return),
            "sharpe" => Ok(RankBy::Sharpe),
            "sortino" => Ok(RankBy::Sortino),
            "calmar" => Ok(RankBy::Calmar),
            "win_rate" => Ok(RankBy::WinRate),
            "profit_factor" => Ok(RankBy::ProfitFactor),
            "max_drawdown" | "drawdown" => Ok(RankBy::MaxDrawdown),
            _ => Err(format!("Unknown ranking metric: {}", s)),
        }
    }
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RankBy::Return => "return",
            RankBy::Sharpe => "sharpe",
            RankBy::Sortino => "sortino",
            RankBy::Calmar => "calmar",
            RankBy::WinRate => "win_rate",
            RankBy::ProfitFactor => "profit_factor",
            RankBy::MaxDrawdown => "max_drawdown",
        };
        write!(f, "{}", s)
    }
}

/// One completed run of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub params: StrategyParams,
    pub metrics: PerformanceMetrics,
}

/// A run that ended in an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub params: StrategyParams,
    pub error: String,
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub entries: Vec<SweepEntry>,
    pub failed: Vec<SweepFailure>,
    /// Combinations rejected by validation
    pub invalid: usize,
    /// Runs never started because the sweep was cancelled
    pub skipped: usize,
    pub cancelled: bool,
}

impl SweepResults {
    /// Best entry by `metric`; the earliest wins ties.
    pub fn best_by(&self, metric: RankBy) -> Option<&SweepEntry> {
        self.ranked(metric).into_iter().next()
    }

    /// Entries sorted best first. The sort is stable, so ties keep grid order.
    pub fn ranked(&self, metric: RankBy) -> Vec<&SweepEntry> {
        let mut sorted: Vec<&SweepEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| metric.score(&b.metrics).total_cmp(&metric.score(&a.metrics)));
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

enum Outcome {
    Done(SweepEntry),
    Failed(SweepFailure),
    Skipped,
}

/// Parameter sweep executor.
///
/// Runs one backtest per grid combination, in parallel by default. Each
/// run owns its ledger and equity curve; the only shared state is the
/// read-only bar series and an optional cancellation flag checked before
/// each run starts.
pub struct ParamSweep {
    engine: BacktestEngine,
    parallel: bool,
    threads: Option<usize>,
}

impl ParamSweep {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            engine: BacktestEngine::new(config),
            parallel: true,
            threads: None,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use a dedicated pool of `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads.filter(|&n| n > 0);
        self
    }

    /// Execute the sweep.
    pub fn run(
        &self,
        grid: &ParamGrid,
        series: &BarSeries,
        cancel: Option<&AtomicBool>,
    ) -> Result<SweepResults, BacktestError> {
        self.engine.config().validate()?;
        series.validate()?;
        let (configs, invalid) = grid.generate()?;

        info!(
            runs = configs.len(),
            invalid,
            parallel = self.parallel,
            "Starting parameter sweep"
        );

        let outcomes: Vec<Outcome> = match (self.parallel, self.threads) {
            (true, Some(threads)) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| BacktestError::Config(e.to_string()))?;
                pool.install(|| {
                    configs
                        .par_iter()
                        .map(|p| self.run_one(p, series, cancel))
                        .collect()
                })
            }
            (true, None) => configs
                .par_iter()
                .map(|p| self.run_one(p, series, cancel))
                .collect(),
            (false, _) => configs
                .iter()
                .map(|p| self.run_one(p, series, cancel))
                .collect(),
        };

        let mut results = SweepResults {
            invalid,
            cancelled: cancel.is_some_and(|f| f.load(Ordering::Relaxed)),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Done(entry) => results.entries.push(entry),
                Outcome::Failed(failure) => results.failed.push(failure),
                Outcome::Skipped => results.skipped += 1,
            }
        }

        info!(
            completed = results.entries.len(),
            failed = results.failed.len(),
            skipped = results.skipped,
            cancelled = results.cancelled,
            "Parameter sweep finished"
        );

        Ok(results)
    }

    fn run_one(
        &self,
        params: &StrategyParams,
        series: &BarSeries,
        cancel: Option<&AtomicBool>,
    ) -> Outcome {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return Outcome::Skipped;
        }

        let result = params
            .build()
            .map_err(BacktestError::from)
            .and_then(|strategy| self.engine.run(strategy.as_ref(), series));

        match result {
            Ok(results) => {
                debug!(%params, return_pct = results.metrics.return_pct, "Sweep run complete");
                Outcome::Done(SweepEntry {
                    params: params.clone(),
                    metrics: results.metrics,
                })
            }
            Err(err) => {
                warn!(%params, error = %err, "Sweep run failed");
                Outcome::Failed(SweepFailure {
                    params: params.clone(),
                    error: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barsim_core::{Bar, Timeframe};
    use barsim_strategies::{MACrossoverConfig, RsiSmaConfig};

    fn wave(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.2).sin() * 10.0 + i as f64 * 0.05;
                Bar::new(i as i64 * 86_400_000, c, c * 1.01, c * 0.99, c, 1_000.0)
            })
            .collect();
        BarSeries::from_bars("WAVE", Timeframe::Daily, bars)
    }

    fn crossover_grid() -> ParamGrid {
        ParamGrid::new(StrategyParams::MaCrossover(MACrossoverConfig {
            use_ema: false,
            ..Default::default()
        }))
        .axis("fast_period", [3, 5, 10])
        .axis("slow_period", [5, 20])
    }

    #[test]
    fn test_grid_generation_drops_invalid() {
        let grid = crossover_grid();
        assert_eq!(grid.size(), 6);

        let (valid, invalid) = grid.generate().unwrap();
        // fast 5/slow 5, fast 10/slow 5
        assert_eq!(invalid, 2);
        assert_eq!(valid.len(), 4);
        assert!(valid.iter().all(|p| p.validate().is_ok()));
    }

    #[test]
    fn test_grid_rejects_unknown_axis() {
        let grid = ParamGrid::new(StrategyParams::RsiSma(RsiSmaConfig::default()))
            .axis("fast_period", [5]);
        assert!(grid.generate().is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let series = wave(200);
        let config = BacktestConfig::new(10_000.0, 0.001);

        let parallel = ParamSweep::new(config.clone())
            .run(&crossover_grid(), &series, None)
            .unwrap();
        let sequential = ParamSweep::new(config)
            .with_parallelism(false)
            .run(&crossover_grid(), &series, None)
            .unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 4);
        assert!(!parallel.cancelled);
    }

    #[test]
    fn test_cancelled_sweep_skips_runs() {
        let series = wave(100);
        let cancel = AtomicBool::new(true);

        let results = ParamSweep::new(BacktestConfig::default())
            .with_threads(Some(2))
            .run(&crossover_grid(), &series, Some(&cancel))
            .unwrap();

        assert!(results.cancelled);
        assert!(results.is_empty());
        assert_eq!(results.skipped, 4);
    }

    #[test]
    fn test_ranking() {
        let results = ParamSweep::new(BacktestConfig::new(10_000.0, 0.0))
            .run(&crossover_grid(), &wave(200), None)
            .unwrap();

        let best = results.best_by(RankBy::Return).unwrap();
        let max = results
            .entries
            .iter()
            .map(|e| e.metrics.return_pct)
            .fold(f64::MIN, f64::max);
        assert_eq!(best.metrics.return_pct, max);

        let ranked = results.ranked(RankBy::MaxDrawdown);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].metrics.max_drawdown_pct <= w[1].metrics.max_drawdown_pct));
    }

    #[test]
    fn test_rank_by_parse() {
        assert_eq!("sharpe".parse::<RankBy>().unwrap(), RankBy::Sharpe);
        assert_eq!("win-rate".parse::<RankBy>().unwrap(), RankBy::WinRate);
        assert!("nope".parse::<RankBy>().is_err());
    }
}
