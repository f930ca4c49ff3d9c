//! Legacy record rehydration
//!
//! Layers flattened user overrides over a base scenario tree and a base
//! reference tree, then reads every catalog entry into the flat record the
//! calculator consumes.

use crate::catalog::{Catalog, Scope};
use crate::record::{ReportYears, TechnologyRecord};
use dd_params::{address, flatten, override_at, Branch, Leaf, Overlay, TreePath};
use std::sync::Arc;
use tracing::debug;

/// Flattened `scenario_vars` / `reference_vars` of a variation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatOverrides {
    scenario: Overlay,
    reference: Overlay,
}

impl FlatOverrides {
    /// Flatten both override trees
    #[must_use]
    pub fn new(scenario_vars: &Branch, reference_vars: &Branch) -> Self {
        Self {
            scenario: flatten(scenario_vars),
            reference: flatten(reference_vars),
        }
    }

    /// Wrap already flat overlays
    #[must_use]
    pub fn from_overlays(scenario: Overlay, reference: Overlay) -> Self {
        Self {
            scenario,
            reference,
        }
    }

    /// Overlay for one scope
    #[inline]
    #[must_use]
    pub fn overlay(&self, scope: Scope) -> &Overlay {
        match scope {
            Scope::Scenario => &self.scenario,
            Scope::Reference => &self.reference,
        }
    }
}

/// Builds [`TechnologyRecord`]s from base trees and overrides
#[derive(Debug, Clone)]
pub struct LegacyRehydrator {
    catalog: Arc<Catalog>,
}

impl LegacyRehydrator {
    /// Create a rehydrator over a loaded catalog
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Rehydrate one technology
    ///
    /// For each catalog entry a non-null override wins, then a non-null base
    /// value; a field found in neither is omitted. A technology missing from
    /// the registry yields a record with no fields; callers check
    /// [`TechnologyRecord::is_empty`].
    #[must_use]
    pub fn rehydrate(
        &self,
        years: ReportYears,
        technology: &str,
        scenario_base: &Branch,
        reference_base: &Branch,
        overrides: &FlatOverrides,
    ) -> TechnologyRecord {
        let mut record = TechnologyRecord::new(technology, years);
        if !self.catalog.is_known(technology) {
            debug!(technology, "technology not in registry, record left empty");
            return record;
        }

        for (scope, base) in [
            (Scope::Scenario, scenario_base),
            (Scope::Reference, reference_base),
        ] {
            let overlay = overrides.overlay(scope);
            for entry in self.catalog.entries_for(scope, technology) {
                let path = entry.path.instantiate(technology);
                if let Some(value) = resolve(overlay, base, &path) {
                    record.insert(entry.legacy.clone(), value.clone());
                }
            }
        }

        debug!(
            technology,
            fields = record.fields.len(),
            "rehydrated technology record"
        );
        record
    }
}

fn resolve<'a>(overlay: &'a Overlay, base: &'a Branch, path: &TreePath) -> Option<&'a Leaf> {
    override_at(overlay, &path.to_string())
        .or_else(|| address::get_leaf_at(base, path).filter(|leaf| !leaf.is_null()))
}
