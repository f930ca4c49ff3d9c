//! Validation of variation overrides
//!
//! [`ValidationEngine`] runs the schema shape check and the adoption-basis
//! rule matrix. Both return a [`ValidationOutcome`]; neither raises.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod engine;
mod outcome;

// Re-exports
pub use engine::ValidationEngine;
pub use outcome::ValidationOutcome;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
