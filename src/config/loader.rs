//! Configuration loading from disk and the command line.

use std::fs;
use std::path::Path;

use crate::config::cli::Args;
use crate::config::schema::RedirectConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<RedirectConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: defaults, then the optional config
/// file, then environment and flags.
pub fn resolve_config(args: &Args) -> Result<RedirectConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => RedirectConfig::default(),
    };
    args.apply(&mut config);
    config.logging.level = config.logging.level.to_ascii_lowercase();

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
