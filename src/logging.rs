//! Structured logging setup.
//!
//! Logs go to stderr so stdout only carries analysis results.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::processor::ProcessorError;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG` when set
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text with targets and source locations
    Text,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    /// Parse from a name, falling back to compact.
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Compact,
        }
    }
}

/// Installs the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ProcessorError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Text => {
            let text_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(text_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let compact_layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(compact_layer)
                .try_init()
        }
    };

    result.map_err(|e| ProcessorError::InvalidConfig(format!("logging: {}", e)))
}
