//! Strategy trait definitions.

use std::collections::BTreeMap;

use super::IndicatorSpec;
use crate::error::StrategyError;
use crate::types::{Bar, OrderIntent, Position};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Indicator readings at one bar index, keyed by [`IndicatorSpec::name`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorValues {
    values: BTreeMap<String, f64>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Defined value for `name`; `None` if missing or still in warm-up.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().filter(|v| !v.is_nan())
    }

    /// True when every published value is past its warm-up.
    pub fn all_defined(&self) -> bool {
        self.values.values().all(|v| !v.is_nan())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for IndicatorValues {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Everything a strategy may look at when deciding on one bar.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub indicators: &'a IndicatorValues,
    /// The ledger's open position, if any
    pub position: Option<&'a Position>,
}

impl BarContext<'_> {
    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }
}

/// Core strategy trait.
///
/// A strategy is a pure decision function over an explicit parameter set: it
/// declares the indicators it needs up front and, per bar, returns at most one
/// intent. The engine only calls [`Strategy::evaluate`] once every declared
/// indicator is defined at the current index.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Indicators to precompute over closing prices.
    fn indicators(&self) -> Vec<IndicatorSpec>;

    /// Decide what to do on the current bar.
    fn evaluate(&self, ctx: &BarContext<'_>) -> Option<OrderIntent>;

    /// Parameters of this instance, echoed in result metadata.
    fn params(&self) -> serde_json::Value;

    /// Number of bars before every declared indicator is defined.
    fn warmup_period(&self) -> usize {
        self.indicators()
            .iter()
            .map(IndicatorSpec::lookback)
            .max()
            .unwrap_or(0)
    }

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFlat;

    impl Strategy for AlwaysFlat {
        fn name(&self) -> &str {
            "flat"
        }

        fn indicators(&self) -> Vec<IndicatorSpec> {
            vec![IndicatorSpec::sma("fast", 5), IndicatorSpec::rsi("rsi", 14)]
        }

        fn evaluate(&self, _ctx: &BarContext<'_>) -> Option<OrderIntent> {
            None
        }

        fn params(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    #[test]
    fn test_strategy_warmup() {
        assert_eq!(AlwaysFlat.warmup_period(), 14);
    }

    #[test]
    fn test_indicator_values_hide_nan() {
        let values: IndicatorValues = [("fast", 10.0), ("rsi", f64::NAN)].into_iter().collect();

        assert_eq!(values.get("fast"), Some(10.0));
        assert_eq!(values.get("rsi"), None);
        assert_eq!(values.get("missing"), None);
        assert!(!values.all_defined());
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_context_flat() {
        let bar = Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0);
        let values = IndicatorValues::new();
        let ctx = BarContext {
            index: 0,
            bar: &bar,
            indicators: &values,
            position: None,
        };
        assert!(ctx.is_flat());
        assert!(AlwaysFlat.evaluate(&ctx).is_none());
    }
}
