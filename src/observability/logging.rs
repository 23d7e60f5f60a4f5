//! Structured logging.
//!
//! Console output is always on. With `to_file` set, the same events are also
//! written to a size-rotated file, as plain text or JSON lines. `RUST_LOG`
//! overrides the configured level.

use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::observability::rolling::RollingFile;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    File(#[from] std::io::Error),
    #[error("failed to install logger: {0}")]
    Init(#[from] TryInitError),
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("kfrs={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    let file_layer: Option<Box<dyn Layer<Registry> + Send + Sync>> = if config.to_file {
        let writer = Mutex::new(RollingFile::from_config(config)?);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.file_format {
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
            LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
        };
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer())
        .with(filter)
        .try_init()?;

    Ok(())
}
