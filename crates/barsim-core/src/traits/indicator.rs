//! Indicator trait definitions.

use serde::{Deserialize, Serialize};

/// Trait for technical indicators.
///
/// Implementations return a series aligned 1:1 with the input: entries before
/// [`Indicator::lookback`] are `NaN`, everything from it onward is defined.
/// A period longer than the input is not an error and yields an all-`NaN`
/// series.
pub trait Indicator: Send + Sync {
    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<f64>;

    /// Window length the indicator was built with.
    fn period(&self) -> usize;

    /// Index of the first defined output.
    fn lookback(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Whether the output at `index` is past the warm-up.
    fn is_defined_at(&self, index: usize) -> bool {
        index >= self.lookback()
    }
}

/// Indicator families a strategy can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Simple moving average
    Sma,
    /// Exponential moving average
    Ema,
    /// Relative strength index (Wilder)
    Rsi,
}

impl IndicatorKind {
    /// First defined index for a window of `period`.
    pub fn lookback(&self, period: usize) -> usize {
        match self {
            IndicatorKind::Sma | IndicatorKind::Ema => period.saturating_sub(1),
            // needs one extra prior delta
            IndicatorKind::Rsi => period,
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorKind::Sma => write!(f, "SMA"),
            IndicatorKind::Ema => write!(f, "EMA"),
            IndicatorKind::Rsi => write!(f, "RSI"),
        }
    }
}

/// A named indicator a strategy needs precomputed over closing prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Key the value is published under in [`crate::IndicatorValues`]
    pub name: String,
    pub kind: IndicatorKind,
    pub period: usize,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>, kind: IndicatorKind, period: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            period,
        }
    }

    pub fn sma(name: impl Into<String>, period: usize) -> Self {
        Self::new(name, IndicatorKind::Sma, period)
    }

    pub fn ema(name: impl Into<String>, period: usize) -> Self {
        Self::new(name, IndicatorKind::Ema, period)
    }

    pub fn rsi(name: impl Into<String>, period: usize) -> Self {
        Self::new(name, IndicatorKind::Rsi, period)
    }

    /// First defined index.
    pub fn lookback(&self) -> usize {
        self.kind.lookback(self.period)
    }
}
