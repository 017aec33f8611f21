//! CLI command implementations.

pub mod backtest;
mod common;
pub mod strategies;
pub mod sweep;
pub mod validate;
