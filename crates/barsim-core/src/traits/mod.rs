//! Core traits for the simulator.

mod data_source;
mod indicator;
mod strategy;

pub use data_source::DataSource;
pub use indicator::{Indicator, IndicatorKind, IndicatorSpec};
pub use strategy::{BarContext, IndicatorValues, Strategy, StrategyConfig};
