//! Moving Average Crossover Strategy.
//!
//! Goes long while the fast MA sits above the slow MA by more than the
//! threshold and exits once it falls back below. With `allow_short` the
//! mirror image opens short positions.

use barsim_core::{
    error::StrategyError,
    traits::{BarContext, IndicatorSpec, Strategy, StrategyConfig},
    types::OrderIntent,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

const FAST: &str = "ma_fast";
const SLOW: &str = "ma_slow";

/// Configuration for the MA Crossover strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MACrossoverConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    /// Use EMA instead of SMA
    pub use_ema: bool,
    /// Minimum separation between the averages to enter (as a fraction)
    pub signal_threshold: f64,
    /// Fraction of available cash committed per entry
    pub size: f64,
    /// Open shorts on bearish separation
    pub allow_short: bool,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            use_ema: true,
            signal_threshold: 0.001, // 0.1%
            size: 0.95,
            allow_short: false,
        }
    }
}

impl StrategyConfig for MACrossoverConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.signal_threshold) {
            return Err(StrategyError::InvalidConfig(
                "Signal threshold must be in [0, 1)".into(),
            ));
        }
        if !(self.size > 0.0 && self.size <= 1.0) {
            return Err(StrategyError::InvalidConfig(format!(
                "Size must be in (0, 1], got {}",
                self.size
            )));
        }
        Ok(())
    }
}

/// Moving Average Crossover Strategy.
#[derive(Debug, Clone)]
pub struct MACrossoverStrategy {
    config: MACrossoverConfig,
}

impl MACrossoverStrategy {
    /// Create a new MA Crossover strategy.
    pub fn new(config: MACrossoverConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MACrossoverConfig {
        &self.config
    }
}

impl Strategy for MACrossoverStrategy {
    fn name(&self) -> &str {
        "MA Crossover"
    }

    fn description(&self) -> &str {
        "Follows fast/slow moving average crossovers"
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        if self.config.use_ema {
            vec![
                IndicatorSpec::ema(FAST, self.config.fast_period),
                IndicatorSpec::ema(SLOW, self.config.slow_period),
            ]
        } else {
            vec![
                IndicatorSpec::sma(FAST, self.config.fast_period),
                IndicatorSpec::sma(SLOW, self.config.slow_period),
            ]
        }
    }

    fn evaluate(&self, ctx: &BarContext<'_>) -> Option<OrderIntent> {
        let fast = ctx.indicators.get(FAST)?;
        let slow = ctx.indicators.get(SLOW)?;
        let threshold = self.config.signal_threshold;

        let intent = match ctx.position {
            None if fast > slow * (1.0 + threshold) => Some(OrderIntent::buy(self.config.size)),
            None if self.config.allow_short && fast < slow * (1.0 - threshold) => {
                Some(OrderIntent::sell_short(self.config.size))
            }
            Some(pos) if pos.is_long() && fast < slow => Some(OrderIntent::Close),
            Some(pos) if pos.is_short() && fast > slow => Some(OrderIntent::Close),
            _ => None,
        };
        if let Some(intent) = &intent {
            trace!(bar = ctx.index, fast, slow, %intent, "MA crossover signal");
        }
        intent
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}
