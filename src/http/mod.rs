//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, lifecycle)
//!     → handler.rs (guard, path policy, ServeFile)
//!     → response.rs (status + plain text body on rejection)
//!     → Send to client
//! ```

pub mod handler;
pub mod response;
pub mod server;

pub use handler::AppState;
pub use response::RedirectError;
pub use server::{RedirectServer, ServerError};
