//! Logging initialization.
//!
//! The library only emits records through the `log` facade. Embedders that
//! have no logger of their own can install `env_logger` with one of these.
//! Each fails if a logger is already installed.

use log::{LevelFilter, SetLoggerError};

/// Log to stderr at `level` and above.
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init()
}

/// Log according to `RUST_LOG`, falling back to `default_level`.
pub fn init_logging_from_env(default_level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.to_string()),
    )
    .format_timestamp_millis()
    .try_init()
}

/// Log with an `env_logger` filter string, e.g. `"narcissus=debug,info"`.
pub fn init_logging_with_filter(filter: &str) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init()
}
