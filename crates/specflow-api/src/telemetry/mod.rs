//! Telemetry: tracing subscriber setup and Prometheus metrics

pub mod metrics;

pub use metrics::{SpecflowMetrics, ValidationTimer};

use specflow_core::config::LoggingConfig;
use specflow_core::LogFormat;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors from telemetry operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics encoding error: {0}")]
    Encoding(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout clean for CLI output
    Stderr,
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig, target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match (config.format, target) {
        (LogFormat::Json, LogTarget::Stdout) => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        (LogFormat::Json, LogTarget::Stderr) => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Pretty, LogTarget::Stdout) => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        (LogFormat::Pretty, LogTarget::Stderr) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Subscriber(e.to_string()))
}
