//! Technical indicators computed wholesale over a fully known price history.
//!
//! This crate provides O(n) rolling implementations of:
//! - Moving averages (SMA, EMA)
//! - Momentum oscillators (RSI)
//!
//! Every indicator returns a series aligned 1:1 with its input, with `NaN`
//! marking the warm-up. [`IndicatorSet`] precomputes everything a strategy
//! declares before the simulation loop starts.

pub mod momentum;
pub mod moving_average;
mod set;

pub use momentum::Rsi;
pub use moving_average::{Ema, Sma};
pub use set::{build_indicator, IndicatorSeries, IndicatorSet};
