//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, console + rolling.rs file)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout and the rotated log file
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod rolling;

pub use logging::{init_logging, LoggingError};
