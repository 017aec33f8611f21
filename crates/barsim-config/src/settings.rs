//! Configuration structures.

use std::path::PathBuf;

use barsim_backtest::{BacktestConfig, RankBy};
use barsim_core::Timeframe;
use barsim_strategies::StrategyParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub sweep: SweepSettings,
}

impl AppConfig {
    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.backtest
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        self.strategy
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("[strategy] {}", e)))?;

        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::Invalid("[logging] level is empty".into()));
        }
        if self.sweep.threads == Some(0) {
            return Err(SettingsError::Invalid(
                "[sweep] threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "barsim".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Where market data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file or directory of `{SYMBOL}_{timeframe}.csv` files
    pub data_dir: Option<PathBuf>,
    pub symbol: Option<String>,
    pub timeframe: Timeframe,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            symbol: None,
            timeframe: Timeframe::Daily,
        }
    }
}

/// Parameter sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub parallel: bool,
    /// Worker threads; rayon's global pool when unset
    pub threads: Option<usize>,
    pub rank_by: RankBy,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            rank_by: RankBy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.app.name, "barsim");
        assert_eq!(config.sweep.rank_by, RankBy::Sharpe);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let mut config = AppConfig::default();
        config.sweep.threads = Some(0);
        assert!(matches!(config.validate(), Err(SettingsError::Invalid(_))));
    }
}
