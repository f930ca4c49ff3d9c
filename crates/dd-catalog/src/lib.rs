//! Legacy parameter catalog and record rehydration
//!
//! Immutable configuration describing where each legacy calculator field
//! lives in a parameter tree, what shapes an override may take there, and
//! which fields each adoption basis requires. Loaded once (see
//! [`Catalog::builtin`]) and shared behind an `Arc`.
//!
//! # Core Concepts
//!
//! - [`Catalog`]: scenario and reference path catalogs, technology registry
//! - [`Shape`]: accepted leaf shapes of an override path
//! - [`RuleMatrix`]: adoption basis → field rules
//! - [`LegacyRehydrator`]: base trees + overrides → [`TechnologyRecord`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod catalog;
mod error;
mod record;
mod rehydrate;
mod rules;

// Re-exports
pub use catalog::{Catalog, CatalogEntry, Scope, Shape, TechnologyInfo};
pub use error::{CatalogError, CatalogResult, RehydrateError};
pub use record::{ReportYears, TechnologyRecord};
pub use rehydrate::{FlatOverrides, LegacyRehydrator};
pub use rules::{AdoptionBasis, FieldRule, ReferenceBasis, RuleMatrix, UnknownBasis};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        AdoptionBasis, Catalog, FlatOverrides, LegacyRehydrator, ReferenceBasis, ReportYears,
        Scope, TechnologyRecord,
    };
}
