//! CLI definitions.

pub mod commands;

use barsim_backtest::RankBy;
use barsim_core::{ExecutionTiming, Timeframe};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "barsim")]
#[command(author, version, about = "Single-asset bar-by-bar backtesting simulator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BARSIM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one backtest
    Backtest(BacktestArgs),
    /// Run a parameter sweep and rank the results
    Sweep(SweepArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

/// Where to read bars from.
#[derive(clap::Args)]
pub struct DataArgs {
    /// CSV file, or directory of {SYMBOL}_{timeframe}.csv / {SYMBOL}.csv files
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Symbol to load; defaults to the file stem of --data
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1wk, 1mo)
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Strategy and account settings shared by backtests and sweeps.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Strategy key (see `barsim strategies`)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Override one strategy parameter, e.g. --param rsi_period=10
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<f64>,

    /// Commission rate per side, as a fraction of notional
    #[arg(long)]
    pub commission: Option<f64>,

    /// Fill timing (same_bar_close, next_bar_open)
    #[arg(long)]
    pub execution: Option<ExecutionTiming>,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub run: RunArgs,

    /// Print results as JSON instead of a text summary
    #[arg(long)]
    pub json: bool,

    /// Save results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save the trade list as CSV
    #[arg(long)]
    pub trades_csv: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub run: RunArgs,

    /// Grid axis, e.g. --axis fast_period=5,10,20 (repeatable)
    #[arg(short, long = "axis", value_name = "NAME=V1,V2,..", required = true)]
    pub axes: Vec<String>,

    /// Ranking metric (return, sharpe, sortino, calmar, win_rate, profit_factor, max_drawdown)
    #[arg(long)]
    pub rank_by: Option<RankBy>,

    /// Number of ranked results to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Run combinations one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Save results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
