//! RSI mean-reversion entries filtered by an SMA trend.
//!
//! Buys an oversold RSI reading while the fast SMA is above the slow SMA,
//! and exits once RSI turns overbought.

use barsim_core::{
    error::StrategyError,
    traits::{BarContext, IndicatorSpec, Strategy, StrategyConfig},
    types::OrderIntent,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

const RSI: &str = "rsi";
const SMA_FAST: &str = "sma_fast";
const SMA_SLOW: &str = "sma_slow";

/// Configuration for the RSI + SMA strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiSmaConfig {
    /// RSI calculation period
    pub rsi_period: usize,
    /// Close the position above this RSI
    pub overbought: f64,
    /// Enter below this RSI
    pub oversold: f64,
    /// Fast SMA period
    pub sma_fast: usize,
    /// Slow SMA period
    pub sma_slow: usize,
    /// Fraction of available cash committed per entry
    pub size: f64,
}

impl Default for RsiSmaConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            sma_fast: 50,
            sma_slow: 200,
            size: 0.95,
        }
    }
}

impl StrategyConfig for RsiSmaConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.rsi_period < 2 {
            return Err(StrategyError::InvalidConfig(
                "RSI period must be at least 2".into(),
            ));
        }
        if self.overbought <= self.oversold {
            return Err(StrategyError::InvalidConfig(
                "Overbought must be greater than oversold".into(),
            ));
        }
        if self.overbought > 100.0 || self.oversold < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "RSI thresholds must be between 0 and 100".into(),
            ));
        }
        if self.sma_fast == 0 || self.sma_slow == 0 {
            return Err(StrategyError::InvalidConfig(
                "SMA periods must be greater than 0".into(),
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

/// RSI + SMA trend-filter strategy.
#[derive(Debug, Clone)]
pub struct RsiSmaStrategy {
    config: RsiSmaConfig,
}

impl RsiSmaStrategy {
    /// Create a new strategy from a validated config.
    pub fn new(config: RsiSmaConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RsiSmaConfig {
        &self.config
    }
}

impl Strategy for RsiSmaStrategy {
    fn name(&self) -> &str {
        "RSI + SMA"
    }

    fn description(&self) -> &str {
        "Buys oversold RSI in an SMA uptrend, exits on overbought RSI"
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        vec![
            IndicatorSpec::rsi(RSI, self.config.rsi_period),
            IndicatorSpec::sma(SMA_FAST, self.config.sma_fast),
            IndicatorSpec::sma(SMA_SLOW, self.config.sma_slow),
        ]
    }

    fn evaluate(&self, ctx: &BarContext<'_>) -> Option<OrderIntent> {
        let rsi = ctx.indicators.get(RSI)?;
        let fast = ctx.indicators.get(SMA_FAST)?;
        let slow = ctx.indicators.get(SMA_SLOW)?;

        let intent = match ctx.position {
            None if rsi < self.config.oversold && fast > slow => {
                Some(OrderIntent::buy(self.config.size))
            }
            Some(_) if rsi > self.config.overbought => Some(OrderIntent::Close),
            _ => None,
        };
        if let Some(intent) = &intent {
            trace!(bar = ctx.index, rsi, fast, slow, %intent, "RSI + SMA signal");
        }
        intent
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}
