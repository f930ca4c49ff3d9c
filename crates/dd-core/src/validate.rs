//! Variation validation pipeline
//!
//! Runs the shape check, then fetches the variation's parents, rehydrates
//! every technology the overrides touch and runs the rule matrix on the
//! would-be records. A rejected variation is reported, never persisted.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::fetch::{fetch_tree, ResourceFetcher};
use crate::types::VariationPatch;
use dd_catalog::{FlatOverrides, LegacyRehydrator, ReportYears, Scope, TechnologyRecord};
use dd_validation::{ValidationEngine, ValidationOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Validates candidate variations before they join a workbook
pub struct VariationValidator {
    fetcher: Arc<dyn ResourceFetcher>,
    engine: ValidationEngine,
    rehydrator: LegacyRehydrator,
    config: CoreConfig,
}

impl std::fmt::Debug for VariationValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariationValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VariationValidator {
    /// Create validator; engine and rehydrator share one catalog
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        rehydrator: LegacyRehydrator,
        config: CoreConfig,
    ) -> Self {
        Self {
            fetcher,
            engine: ValidationEngine::new(Arc::clone(rehydrator.catalog())),
            rehydrator,
            config,
        }
    }

    /// Validate a candidate variation
    ///
    /// The shape check may rewrite `patch` (bare numbers become
    /// `{value, statistic}` records). Rejection is returned as an outcome.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::NotFound`] if a parent resource is
    /// missing
    pub async fn validate_variation(
        &self,
        patch: &mut VariationPatch,
        years: ReportYears,
    ) -> CoreResult<ValidationOutcome> {
        let shape = self
            .engine
            .validate(&mut patch.scenario_vars, &mut patch.reference_vars);
        if !shape.valid {
            return Ok(shape);
        }

        let fetcher = &*self.fetcher;
        let scenario = fetch_tree(fetcher, "Scenario", &patch.scenario_parent_path).await?;
        let reference = fetch_tree(fetcher, "Reference", &patch.reference_parent_path).await?;
        let overrides = FlatOverrides::new(&patch.scenario_vars, &patch.reference_vars);

        let catalog = self.rehydrator.catalog();
        let technologies: BTreeSet<String> = catalog
            .technologies_in(Scope::Scenario, overrides.overlay(Scope::Scenario))
            .into_iter()
            .chain(catalog.technologies_in(Scope::Reference, overrides.overlay(Scope::Reference)))
            .filter(|t| !self.config.is_excluded(t))
            .collect();
        debug!(technologies = technologies.len(), "validating rehydrated records");

        let records: Vec<TechnologyRecord> = technologies
            .iter()
            .map(|t| {
                self.rehydrator
                    .rehydrate(years, t, &scenario, &reference, &overrides)
            })
            .collect();

        Ok(self
            .engine
            .validate_full_schema(&records)
            .with_prior_warnings(shape.warnings))
    }
}
