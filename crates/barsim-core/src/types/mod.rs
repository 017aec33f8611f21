//! Core data types for the simulator.

mod ohlcv;
mod order;
mod position;
mod timeframe;

pub use ohlcv::{naive_from_millis, Bar, BarSeries};
pub use order::{ExecutionTiming, OrderIntent, Side};
pub use position::{EquityPoint, Position, Trade};
pub use timeframe::Timeframe;
