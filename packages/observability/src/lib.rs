//! # Observability
//!
//! Centralized logging setup for Tessera processes.
//!
//! Libraries only use `tracing` macros. Binaries call `init_with_config` once
//! at startup and decide where lines go:
//!
//! - a compact stderr layer, when `also_stderr` is set
//! - a JSONL file, one object per line, when `log_path` is set
//!
//! `RUST_LOG` overrides `default_level`. Fields whose names mark secret
//! material are written to the JSONL file as `[REDACTED]`.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "cli".into(),
//!     log_path: Some(home.join("logs").join("cli.jsonl")),
//!     also_stderr: false,
//!     ..Default::default()
//! });
//! ```

mod json_layer;
mod writer;

pub use json_layer::{is_sensitive_field, JsonLayer, LogEntry, REDACTED};
pub use writer::{AppendWriter, WriterFactory};

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Where log lines go and how verbose they are.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSONL line.
    pub service_name: String,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub default_level: String,

    /// JSONL output file. No file output when unset.
    pub log_path: Option<PathBuf>,

    /// Mirror events to stderr in compact form.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging with default settings and the given service name.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// A log file that cannot be opened is reported on stderr and skipped. A
/// second call in the same process is a no-op.
pub fn init_with_config(config: LogConfig) {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let file_layer = config.log_path.as_ref().and_then(|path| {
        match AppendWriter::new(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
                    .with_filter(filter()),
            ),
            Err(e) => {
                eprintln!("failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter())
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
