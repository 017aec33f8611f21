//! List strategies command.

use anyhow::Result;
use barsim_strategies::StrategyRegistry;

pub fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ({})", info.name, info.key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if let serde_json::Value::Object(defaults) = &info.default_config {
            for (name, value) in defaults {
                println!("    {:<18} {}", name, value);
            }
        }
        println!();
    }

    println!("Use --strategy <key> to select a strategy and --param NAME=VALUE to override defaults.");
    println!();
    println!("Strategy keys: {}", registry.names().join(", "));

    Ok(())
}
