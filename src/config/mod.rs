//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (KFRS_* environment variables, then flags)
//!     → validation.rs (semantic checks)
//!     → RedirectConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Args;
pub use loader::{read_config, resolve_config, ConfigError};
pub use schema::{LogFormat, LoggingConfig, MetricsConfig, RedirectConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
