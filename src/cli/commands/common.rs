//! Helpers shared by the backtest and sweep commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use barsim_backtest::BacktestConfig;
use barsim_config::AppConfig;
use barsim_core::{BarSeries, DataSource};
use barsim_data::CsvDataSource;
use barsim_strategies::{StrategyParams, StrategyRegistry};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::cli::{DataArgs, RunArgs};

/// Parse a `name=value` pair. Values are read as JSON when possible, so
/// `10`, `0.5` and `true` keep their types; anything else is a string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("empty parameter name in '{}'", raw);
    }
    Ok((name.to_string(), parse_value(value.trim())))
}

pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Strategy parameters from config, `--strategy` and `--param` overrides.
///
/// Choosing a strategy other than the configured one starts from that
/// strategy's defaults.
pub fn resolve_strategy(config: &AppConfig, args: &RunArgs) -> Result<StrategyParams> {
    let registry = StrategyRegistry::new();
    let key = args
        .strategy
        .as_deref()
        .unwrap_or_else(|| config.strategy.key());

    let mut value = if key == config.strategy.key() {
        serde_json::to_value(&config.strategy)?
    } else {
        registry
            .get(key)
            .map(|info| info.default_config.clone())
            .with_context(|| {
                format!(
                    "unknown strategy '{}' (available: {})",
                    key,
                    registry.names().join(", ")
                )
            })?
    };

    let Value::Object(fields) = &mut value else {
        bail!("strategy parameters for '{}' are not an object", key);
    };
    for raw in &args.params {
        let (name, v) = parse_assignment(raw)?;
        if !fields.contains_key(&name) {
            bail!("unknown parameter '{}' for strategy '{}'", name, key);
        }
        fields.insert(name, v);
    }
    fields.remove("strategy");

    registry
        .params(key, value)
        .with_context(|| format!("invalid parameters for strategy '{}'", key))
}

/// Account settings from config with command line overrides applied.
pub fn resolve_backtest(config: &AppConfig, args: &RunArgs) -> Result<BacktestConfig> {
    let mut backtest = config.backtest.clone();
    if let Some(cash) = args.cash {
        backtest.initial_cash = cash;
    }
    if let Some(commission) = args.commission {
        backtest.commission_rate = commission;
    }
    if let Some(execution) = args.execution {
        backtest.execution = execution;
    }
    backtest.validate()?;
    Ok(backtest)
}

/// Load the bar series selected by `args`, falling back to the `[data]`
/// section of the configuration.
pub async fn load_series(config: &AppConfig, args: &DataArgs) -> Result<BarSeries> {
    let Some(path) = args.data.as_ref().or(config.data.data_dir.as_ref()) else {
        bail!("Please provide a data file or directory with --data (e.g. --data ./data)");
    };
    if !path.exists() {
        bail!(
            "Data path '{}' does not exist. Provide a CSV file or directory containing CSV files",
            path.display()
        );
    }

    let symbol = args
        .symbol
        .clone()
        .or_else(|| config.data.symbol.clone())
        .or_else(|| file_stem(path))
        .context("no symbol given; use --symbol when --data is a directory")?;
    let timeframe = args.timeframe.unwrap_or(config.data.timeframe);

    let csv = CsvDataSource::new(path.as_path())?;
    let series = match (args.start, args.end) {
        (None, None) => csv.load_all(&symbol, timeframe).await?,
        (start, end) => {
            csv.get_historical_bars(
                &symbol,
                timeframe,
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )
            .await?
        }
    };

    info!(
        symbol = %series.symbol,
        %timeframe,
        bars = series.len(),
        "Loaded bar series"
    );
    Ok(series)
}

fn file_stem(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.split('_').next().unwrap_or(s).to_uppercase())
}
