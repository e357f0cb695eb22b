//! Logging setup for Tessera binaries.

use crate::{Config, Paths};
use observability::LogConfig;
use tracing::Level;

/// Install the process-wide subscriber from `config`.
///
/// JSONL goes to `paths.log_file()` when `paths` is given. `RUST_LOG` wins
/// over `config.log_level`.
pub fn init_logging(service_name: &str, config: &Config, paths: Option<&Paths>, also_stderr: bool) {
    let level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.as_str().to_ascii_lowercase(),
        log_path: paths.map(Paths::log_file),
        also_stderr,
    });
}

/// Parse a level name, case-insensitively. `warning` is accepted for `warn`.
pub fn parse_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
