//! Error types for the backtesting simulator.

use thiserror::Error;

/// Run-level error. A run either produces complete results or exactly one of these.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("No data: {0}")]
    NoData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Ledger contract violations.
///
/// These are recovered inside the simulation loop: the offending intent is
/// logged, recorded and discarded, and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid size: fraction {0} is outside (0, 1]")]
    InvalidSize(f64),

    #[error("Position already open")]
    PositionAlreadyOpen,

    #[error("No open position")]
    NoOpenPosition,

    #[error("Insufficient cash: {available:.2} buys zero units at {price:.4}")]
    InsufficientCash { available: f64, price: f64 },
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Duplicate indicator name: {0}")]
    DuplicateName(String),
}

/// Result type alias for run-level operations.
pub type BacktestResult<T> = Result<T, BacktestError>;
