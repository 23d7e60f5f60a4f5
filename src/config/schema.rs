//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirect
//! server. All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the redirect server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectConfig {
    /// Listener, served directory and abuse protection.
    pub server: ServerConfig,

    /// Console and file logging.
    pub logging: LoggingConfig,

    /// Prometheus exporter.
    pub metrics: MetricsConfig,
}

/// Server configuration consumed by [`crate::http::RedirectServer`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP or host name to bind to.
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Directory holding the redirect files.
    pub serve_dir: PathBuf,

    /// Maximum requests per client address in a 60 second window.
    pub max_requests: u32,

    /// Ban duration in minutes.
    pub ban_time: u32,

    /// Upper bound on a single request, in seconds.
    pub request_timeout_secs: u64,

    /// How often idle client records are evicted, in seconds. 0 disables it.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
            serve_dir: PathBuf::from("./redirect"),
            max_requests: 20,
            ban_time: 15,
            request_timeout_secs: 30,
            sweep_interval_secs: 300,
        }
    }
}

/// Output format of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log file format: {other} (expected text or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Also write logs to `file`.
    pub to_file: bool,

    /// Log file path.
    pub file: PathBuf,

    /// Log file format.
    pub file_format: LogFormat,

    /// Size in megabytes after which the log file is rotated.
    pub max_size: u64,

    /// Number of rotated files to keep.
    pub max_backups: u32,

    /// Days to keep rotated files.
    pub max_age: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: false,
            file: PathBuf::from("./kfrs.log"),
            file_format: LogFormat::Text,
            max_size: 10,
            max_backups: 5,
            max_age: 28,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedirectConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.serve_dir, PathBuf::from("./redirect"));
        assert_eq!(config.server.max_requests, 20);
        assert_eq!(config.server.ban_time, 15);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file_format, LogFormat::Text);
        assert!(!config.logging.to_file);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: RedirectConfig = toml::from_str(
            r#"
            [server]
            port = 7070
            max_requests = 5

            [logging]
            file_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.max_requests, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.server.ban_time, 15);
        assert_eq!(config.logging.file_format, LogFormat::Json);
        assert_eq!(config.logging.max_backups, 5);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
