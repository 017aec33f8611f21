//! Backtest command implementation.

use anyhow::{Context, Result};
use barsim_backtest::BacktestEngine;
use barsim_config::AppConfig;
use tracing::info;

use super::common::{load_series, resolve_backtest, resolve_strategy};
use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let params = resolve_strategy(config, &args.run)?;
    let backtest_config = resolve_backtest(config, &args.run)?;
    info!(strategy = %params, "Starting backtest");

    let series = load_series(config, &args.data).await?;

    let results = tokio::task::spawn_blocking(move || {
        let strategy = params.build()?;
        BacktestEngine::new(backtest_config).run(strategy.as_ref(), &series)
    })
    .await
    .context("backtest task failed")?
    .context("backtest failed")?;

    if args.json {
        println!("{}", results.to_json()?);
    } else {
        println!("{}", results.summary());
    }

    if let Some(path) = &args.output {
        results
            .save_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }
    if let Some(path) = &args.trades_csv {
        results
            .save_trades_csv(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Trades saved to {}", path.display());
    }
    if let Some(path) = &args.equity_csv {
        results
            .save_equity_csv(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Equity curve saved to {}", path.display());
    }

    Ok(())
}
