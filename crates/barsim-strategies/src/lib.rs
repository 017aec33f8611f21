//! Trading strategy implementations.
//!
//! Every strategy is an explicit, serializable parameter set paired with a
//! pure per-bar evaluator:
//! - RSI + SMA trend filter (the reference strategy)
//! - Moving Average Crossover
//!
//! [`StrategyParams`] is the tagged union used by configuration files,
//! parameter sweeps and the CLI.

mod ma_crossover;
mod params;
mod registry;
mod rsi_sma;

pub use ma_crossover::{MACrossoverConfig, MACrossoverStrategy};
pub use params::StrategyParams;
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rsi_sma::{RsiSmaConfig, RsiSmaStrategy};
