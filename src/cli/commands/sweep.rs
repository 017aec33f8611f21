//! Parameter sweep command implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use barsim_backtest::{ParamGrid, ParamSweep, RankBy, SweepResults};
use barsim_config::AppConfig;
use serde_json::Value;
use tracing::{info, warn};

use super::common::{load_series, parse_value, resolve_backtest, resolve_strategy};
use crate::cli::SweepArgs;

/// Parse `name=v1,v2,...` into a grid axis.
fn parse_axis(raw: &str) -> Result<(String, Vec<Value>)> {
    let (name, values) = raw
        .split_once('=')
        .with_context(|| format!("expected NAME=V1,V2,.., got '{}'", raw))?;
    let values: Vec<Value> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_value)
        .collect();
    if values.is_empty() {
        anyhow::bail!("axis '{}' has no values", name.trim());
    }
    Ok((name.trim().to_string(), values))
}

pub async fn run(args: SweepArgs, config: &AppConfig) -> Result<()> {
    let base = resolve_strategy(config, &args.run)?;
    let backtest_config = resolve_backtest(config, &args.run)?;

    let mut grid = ParamGrid::new(base);
    for raw in &args.axes {
        let (name, values) = parse_axis(raw)?;
        grid = grid.axis(name, values);
    }

    let rank_by = args.rank_by.unwrap_or(config.sweep.rank_by);
    let parallel = config.sweep.parallel && !args.sequential;
    let threads = args.threads.or(config.sweep.threads);

    let series = load_series(config, &args.data).await?;
    info!(combinations = grid.size(), %rank_by, "Starting sweep");

    let cancel = Arc::new(AtomicBool::new(false));
    let signal = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight runs");
                cancel.store(true, Ordering::Relaxed);
            }
        })
    };

    let results = {
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || {
            ParamSweep::new(backtest_config)
                .with_parallelism(parallel)
                .with_threads(threads)
                .run(&grid, &series, Some(cancel.as_ref()))
        })
        .await
        .context("sweep task failed")?
        .context("sweep failed")?
    };
    signal.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{}", render_table(&results, rank_by, args.top));
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Sweep results saved to {}", path.display());
    }

    if results.cancelled {
        anyhow::bail!("sweep cancelled, {} runs skipped", results.skipped);
    }
    Ok(())
}

fn render_table(results: &SweepResults, rank_by: RankBy, top: usize) -> String {
    let mut s = String::new();

    s.push_str("═══════════════════════════════════════════════════════════════════════════════\n");
    s.push_str(&format!("  PARAMETER SWEEP (ranked by {})\n", rank_by));
    s.push_str("═══════════════════════════════════════════════════════════════════════════════\n");
    s.push_str(&format!(
        "  Completed: {}   Failed: {}   Invalid: {}   Skipped: {}\n\n",
        results.entries.len(),
        results.failed.len(),
        results.invalid,
        results.skipped
    ));

    s.push_str(&format!(
        "  {:>4}  {:>9}  {:>7}  {:>8}  {:>7}  {:>8}  {}\n",
        "#", "Return %", "Sharpe", "MaxDD %", "Trades", "Win %", "Parameters"
    ));
    s.push_str("  ─────────────────────────────────────────────────────────────────────────────\n");
    for (rank, entry) in results.ranked(rank_by).into_iter().take(top).enumerate() {
        let m = &entry.metrics;
        s.push_str(&format!(
            "  {:>4}  {:>9.2}  {:>7.2}  {:>8.2}  {:>7}  {:>8.2}  {}\n",
            rank + 1,
            m.return_pct,
            m.sharpe_ratio,
            m.max_drawdown_pct,
            m.num_trades,
            m.win_rate_pct,
            entry.params
        ));
    }

    for failure in &results.failed {
        s.push_str(&format!("  failed: {} ({})\n", failure.params, failure.error));
    }
    s
}
