//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (ban check, per-address accounting)
//!     → path.rs (decode, clean, containment under the root)
//!     → Pass to the file policy
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod path;
pub mod rate_limit;

pub use rate_limit::{AccessGuard, Admission};
