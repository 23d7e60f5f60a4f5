//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → main stops the server
//!
//! Shutdown (shutdown.rs):
//!     RedirectServer::stop → trigger → accept loop drains, sweeper exits
//! ```
//!
//! # Design Decisions
//! - Shutdown has a deadline: the server gives up waiting after a fixed timeout

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
