//! Log output setup for the `strata` binary
//!
//! The library only talks to the `log` facade. Binaries and tests that want
//! output call [`init`], which installs `env_logger` with a default filter
//! taken from the configuration. `RUST_LOG` still wins when it is set.

use log::LevelFilter;

use crate::config::LoggingConfig;

/// Default filter for a run: `--debug` forces "debug", otherwise the
/// configured level (falling back to "info" when it names no level).
pub fn default_filter(config: &LoggingConfig, debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }
    match config.level.parse::<LevelFilter>() {
        Ok(level) => level.to_string().to_ascii_lowercase(),
        Err(_) => "info".to_string(),
    }
}

/// Installs `env_logger` as the global logger.
///
/// Returns `false` if a logger was already installed, which happens when
/// several tests in one process initialise logging.
pub fn init(config: &LoggingConfig, debug: bool) -> bool {
    let filter = default_filter(config, debug);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
