//! Logger setup

use env_logger::{Builder, Env};

/// Initializes `env_logger` with `default_level` unless `RUST_LOG` is set
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
