//! Business logic services.
//!
//! # Services
//!
//! - `access` - Organizational access policy for verified identities
//! - `usage` - Fire-and-forget usage audit

pub mod access;
pub mod usage;

pub use access::{AuthError, authorize};
pub use usage::{UsageRecorder, UsageRow, UsageSink};
