//! Strategy registry for lookup by name.

use std::collections::BTreeMap;

use barsim_core::{error::StrategyError, traits::Strategy};
use serde::{Deserialize, Serialize};

use crate::{MACrossoverConfig, RsiSmaConfig, StrategyParams};

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key, also the `strategy` tag in config files
    pub key: String,
    /// Display name
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry of the built-in strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
        };

        registry.register(
            "rsi_sma",
            "RSI + SMA",
            "Buys oversold RSI while the fast SMA is above the slow SMA, exits on overbought RSI",
            serde_json::to_value(RsiSmaConfig::default()).unwrap_or_default(),
        );
        registry.register(
            "ma_crossover",
            "MA Crossover",
            "Follows fast/slow moving average crossovers, optionally shorting",
            serde_json::to_value(MACrossoverConfig::default()).unwrap_or_default(),
        );

        registry
    }

    fn register(&mut self, key: &str, name: &str, description: &str, default_config: serde_json::Value) {
        self.strategies.insert(
            key.to_string(),
            StrategyInfo {
                key: key.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                default_config,
            },
        );
    }

    /// List all available strategies, ordered by key.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by key.
    pub fn get(&self, key: &str) -> Option<&StrategyInfo> {
        self.strategies.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Parse and validate parameters for `key`.
    pub fn params(&self, key: &str, config: serde_json::Value) -> Result<StrategyParams, StrategyError> {
        if !self.exists(key) {
            return Err(StrategyError::NotFound(key.to_string()));
        }
        StrategyParams::from_value(key, config)
    }

    /// Create a strategy instance from configuration.
    pub fn create(&self, key: &str, config: serde_json::Value) -> Result<Box<dyn Strategy>, StrategyError> {
        self.params(key, config)?.build()
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, key: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(key)
            .ok_or_else(|| StrategyError::NotFound(key.to_string()))?;
        self.create(key, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.names(), vec!["ma_crossover", "rsi_sma"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("rsi_sma").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.get("rsi_sma").unwrap().default_config["oversold"], 30.0);
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();

        let strategy = registry.create_default("ma_crossover").unwrap();
        assert_eq!(strategy.name(), "MA Crossover");
    }

    #[test]
    fn test_create_with_partial_config() {
        let registry = StrategyRegistry::new();

        let config = serde_json::json!({
            "fast_period": 5,
            "slow_period": 10,
            "use_ema": false
        });

        let strategy = registry.create("ma_crossover", config).unwrap();
        assert_eq!(strategy.params()["signal_threshold"], 0.001);
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();

        assert!(matches!(
            registry.create_default("unknown"),
            Err(StrategyError::NotFound(_))
        ));
    }
}
