//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks value ranges and the
//! environment the server depends on (bindable host, existing directory).
//! Every failure is reported, not just the first.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::config::schema::RedirectConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid host: {0}")]
    Host(String),
    #[error("port must be between 1025 and 65534: {0}")]
    Port(u16),
    #[error("directory does not exist: {0}")]
    ServeDir(String),
    #[error("max requests should be between 1 and 99: {0}")]
    MaxRequests(u32),
    #[error("ban time should be greater than 0: {0}")]
    BanTime(u32),
    #[error("request timeout should be greater than 0")]
    RequestTimeout,
    #[error("invalid log level: {0}")]
    LogLevel(String),
    #[error("log max size should be greater than 0: {0}")]
    LogMaxSize(u64),
    #[error("log max backups should be greater than 0: {0}")]
    LogMaxBackups(u32),
    #[error("log max age should be greater than 0: {0}")]
    LogMaxAge(u32),
    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &RedirectConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;
    let logging = &config.logging;

    if !is_valid_host(&server.host) {
        errors.push(ValidationError::Host(server.host.clone()));
    }
    if !(1025..=65534).contains(&server.port) {
        errors.push(ValidationError::Port(server.port));
    }
    if !server.serve_dir.is_dir() {
        errors.push(ValidationError::ServeDir(server.serve_dir.display().to_string()));
    }
    if !(1..=99).contains(&server.max_requests) {
        errors.push(ValidationError::MaxRequests(server.max_requests));
    }
    if server.ban_time == 0 {
        errors.push(ValidationError::BanTime(server.ban_time));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if !LOG_LEVELS.contains(&logging.level.as_str()) {
        errors.push(ValidationError::LogLevel(logging.level.clone()));
    }
    if logging.max_size == 0 {
        errors.push(ValidationError::LogMaxSize(logging.max_size));
    }
    if logging.max_backups == 0 {
        errors.push(ValidationError::LogMaxBackups(logging.max_backups));
    }
    if logging.max_age == 0 {
        errors.push(ValidationError::LogMaxAge(logging.max_age));
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(config.metrics.address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An IP literal, or a name the system resolver knows.
fn is_valid_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    !host.is_empty()
        && (host, 0u16)
            .to_socket_addrs()
            .map(|mut addrs| addrs.next().is_some())
            .unwrap_or(false)
}
