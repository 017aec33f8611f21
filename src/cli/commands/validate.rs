//! Validate configuration command.

use anyhow::Result;
use barsim_config::load_config;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!("Validating defaults and BARSIM__* environment overrides"),
    }

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Log level: {}", config.logging.level);
            println!("Initial cash: {:.2}", config.backtest.initial_cash);
            println!("Commission rate: {}", config.backtest.commission_rate);
            println!("Execution: {}", config.backtest.execution);
            println!("Strategy: {}", config.strategy);
            println!("Timeframe: {}", config.data.timeframe);
            println!(
                "Sweep: parallel={} rank_by={}",
                config.sweep.parallel, config.sweep.rank_by
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
