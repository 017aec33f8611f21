//! Core types and traits for the backtesting simulator.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Order intents, positions, trades and equity points
//! - Core traits for strategies, indicators and data sources
//! - The error taxonomy shared by every other crate

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BacktestError, BacktestResult, DataError, IndicatorError, LedgerError, StrategyError};
pub use traits::*;
pub use types::*;
