//! KF HTTP Redirect Server library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::RedirectConfig;
pub use http::{RedirectServer, ServerError};
pub use lifecycle::Shutdown;
