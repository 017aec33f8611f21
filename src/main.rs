//! Backtesting simulator CLI application.

mod cli;

use anyhow::{Context, Result};
use barsim_config::{load_config, LogFormat};
use barsim_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::ValidateConfig) {
        return cli::commands::validate::run(cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Setup logging; the guard flushes the log file on exit
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json_logs = cli.json_logs || config.logging.format == LogFormat::Json;
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    let _guard = setup_logging(&log_level, json_logs, log_file)?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config).await,
        Commands::Sweep(args) => cli::commands::sweep::run(args, &config).await,
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig => cli::commands::validate::run(cli.config.as_deref()),
    }
}
