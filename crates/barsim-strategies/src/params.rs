//! Serializable strategy parameter sets.

use barsim_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
};
use serde::{Deserialize, Serialize};

use crate::{MACrossoverConfig, MACrossoverStrategy, RsiSmaConfig, RsiSmaStrategy};

/// One concrete strategy variant together with its parameters.
///
/// Serialized with a `strategy` tag, e.g.
/// `{"strategy": "rsi_sma", "rsi_period": 14, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    RsiSma(RsiSmaConfig),
    MaCrossover(MACrossoverConfig),
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams::RsiSma(RsiSmaConfig::default())
    }
}

impl StrategyParams {
    /// Registry key of the variant.
    pub fn key(&self) -> &'static str {
        match self {
            StrategyParams::RsiSma(_) => "rsi_sma",
            StrategyParams::MaCrossover(_) => "ma_crossover",
        }
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            StrategyParams::RsiSma(c) => c.validate(),
            StrategyParams::MaCrossover(c) => c.validate(),
        }
    }

    /// Build the evaluator for these parameters.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(match self {
            StrategyParams::RsiSma(c) => Box::new(RsiSmaStrategy::new(c.clone())?),
            StrategyParams::MaCrossover(c) => Box::new(MACrossoverStrategy::new(c.clone())?),
        })
    }

    /// Decode a parameter object for the variant named `key`.
    pub fn from_value(key: &str, value: serde_json::Value) -> Result<Self, StrategyError> {
        let invalid = |e: serde_json::Error| StrategyError::InvalidConfig(e.to_string());
        let params = match key {
            "rsi_sma" => StrategyParams::RsiSma(serde_json::from_value(value).map_err(invalid)?),
            "ma_crossover" => {
                StrategyParams::MaCrossover(serde_json::from_value(value).map_err(invalid)?)
            }
            _ => return Err(StrategyError::NotFound(key.to_string())),
        };
        params.validate()?;
        Ok(params)
    }
}

impl std::fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyParams::RsiSma(c) => write!(
                f,
                "rsi_sma(rsi={}, ob={}, os={}, sma={}/{}, size={})",
                c.rsi_period, c.overbought, c.oversold, c.sma_fast, c.sma_slow, c.size
            ),
            StrategyParams::MaCrossover(c) => write!(
                f,
                "ma_crossover({} {}/{}, thr={}, size={}{})",
                if c.use_ema { "ema" } else { "sma" },
                c.fast_period,
                c.slow_period,
                c.signal_threshold,
                c.size,
                if c.allow_short { ", short" } else { "" }
            ),
        }
    }
}
