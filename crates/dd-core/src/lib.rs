//! Scenario calculation core
//!
//! Ties the parameter catalog, validation and content cache together:
//!
//! - [`CalculationOrchestrator`]: workbook commit → manifest of cached results
//! - [`VariationValidator`]: candidate variation → [`ValidationOutcome`]
//! - [`ResourceFetcher`] / [`ScenarioCalculator`]: seams to storage and the
//!   numeric model
//!
//! # Example
//!
//! ```rust,ignore
//! use dd_core::prelude::*;
//!
//! let catalog = Arc::new(Catalog::builtin()?);
//! let config = CoreConfig::default();
//! let cache = Arc::new(config.content_cache(config.build_store(), &catalog));
//! let orchestrator = CalculationOrchestrator::new(
//!     fetcher,
//!     calculator,
//!     cache,
//!     LegacyRehydrator::new(catalog),
//!     config,
//! );
//! let manifest = orchestrator.calculate("7", "3f2a").await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod fetch;
mod orchestrator;
mod scenario;
mod types;
mod validate;

// Re-exports
pub use config::{CoreConfig, DISPLACED_BASELINE};
pub use error::{ConfigError, CoreError, CoreResult, SerializationError};
pub use fetch::{
    fetch_as, fetch_data, fetch_tree, resolve_variation, DirectoryFetcher, ResolvedVariation,
    Resource, ResourceFetcher,
};
pub use orchestrator::{CalculationOrchestrator, CalculationReport};
pub use scenario::{to_json, Scenario, ScenarioCalculator, ScenarioData, ScenarioJson};
pub use types::{VariationPatch, Workbook};
pub use validate::VariationValidator;

pub use dd_cache::{Manifest, ManifestEntry};
pub use dd_validation::ValidationOutcome;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        CalculationOrchestrator, CoreConfig, CoreError, CoreResult, DirectoryFetcher, Manifest,
        ResourceFetcher, Scenario, ScenarioCalculator, ScenarioData, ValidationOutcome,
        VariationPatch, VariationValidator, Workbook,
    };
    pub use dd_catalog::{Catalog, LegacyRehydrator, ReportYears};
    pub use std::sync::Arc;
}
