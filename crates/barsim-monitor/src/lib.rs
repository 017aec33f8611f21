//! Logging setup for the simulator binaries.

mod logging;

pub use logging::{setup_logging, LogGuard};
