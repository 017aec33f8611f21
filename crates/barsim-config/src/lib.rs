//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, DataSettings, LogFormat, LoggingConfig, SettingsError, SweepSettings,
};

use config::{Config, Environment, File};
use std::path::Path;

/// Prefix of environment overrides, e.g. `BARSIM__BACKTEST__INITIAL_CASH`.
pub const ENV_PREFIX: &str = "BARSIM";

/// Load configuration from an optional file and the environment.
///
/// Every section has defaults, so running without a file is valid. The result
/// is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
