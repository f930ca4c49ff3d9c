//! Calculation orchestrator
//!
//! Drives one workbook commit from resources to a manifest of cached
//! results:
//!
//! 1. Return the commit's manifest if it is cached and every result it
//!    names is still stored
//! 2. Resolve the workbook, then each variation and its two parents
//! 3. Rehydrate one record per technology and key it
//! 4. Serve cache hits directly; compute every miss concurrently
//! 5. Store computed results, then the manifest under the commit key
//!
//! All fetching happens before any computation, so a missing resource
//! aborts the request without leaving a partial manifest behind.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::fetch::{fetch_as, resolve_variation, ResourceFetcher};
use crate::scenario::{to_json, ScenarioCalculator};
use crate::types::Workbook;
use dd_cache::{ContentCache, Manifest, ManifestEntry};
use dd_catalog::{LegacyRehydrator, ReportYears, TechnologyRecord};
use dd_params::{CacheKey, Region};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters of one calculation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationReport {
    /// Manifest came straight from the commit cache
    pub from_commit_cache: bool,
    /// Records built across all variations
    pub technologies: usize,
    /// Records whose result was already cached
    pub cache_hits: usize,
    /// Records computed by this request
    pub computed: usize,
    /// Records computed with at least one unreadable field
    pub incomplete: usize,
}

/// One record waiting for a result
#[derive(Debug)]
struct Job {
    key: CacheKey,
    record: TechnologyRecord,
    scenario_name: String,
}

/// Top-level calculation driver
pub struct CalculationOrchestrator {
    fetcher: Arc<dyn ResourceFetcher>,
    calculator: Arc<dyn ScenarioCalculator>,
    cache: Arc<ContentCache>,
    rehydrator: LegacyRehydrator,
    config: CoreConfig,
}

impl std::fmt::Debug for CalculationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationOrchestrator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CalculationOrchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        calculator: Arc<dyn ScenarioCalculator>,
        cache: Arc<ContentCache>,
        rehydrator: LegacyRehydrator,
        config: CoreConfig,
    ) -> Self {
        Self {
            fetcher,
            calculator,
            cache,
            rehydrator,
            config,
        }
    }

    /// Shared result cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Calculate a workbook commit and return its manifest
    ///
    /// # Errors
    /// Returns [`crate::CoreError::NotFound`] if the workbook, a variation or a
    /// parent is missing; calculator and cache errors propagate.
    pub async fn calculate(&self, workbook_id: &str, commit: &str) -> CoreResult<Manifest> {
        self.calculate_with_report(workbook_id, commit)
            .await
            .map(|(manifest, _)| manifest)
    }

    /// Calculate a workbook commit, also returning counters
    ///
    /// # Errors
    /// As [`Self::calculate`]
    pub async fn calculate_with_report(
        &self,
        workbook_id: &str,
        commit: &str,
    ) -> CoreResult<(Manifest, CalculationReport)> {
        let commit_key = ContentCache::commit_key(workbook_id, commit);
        if let Some(manifest) = self.cache.get_manifest(&commit_key).await? {
            if self.cache.manifest_is_live(&manifest).await? {
                info!(workbook_id, commit, entries = manifest.len(), "commit manifest served from cache");
                let report = CalculationReport {
                    from_commit_cache: true,
                    ..CalculationReport::default()
                };
                return Ok((manifest, report));
            }
            warn!(workbook_id, commit, "cached commit manifest names evicted results, recalculating");
        }

        let workbook_path = Workbook::resource_path(workbook_id);
        let workbook: Workbook = fetch_as(&*self.fetcher, "Workbook", &workbook_path).await?;
        let years = ReportYears::new(workbook.start_year, workbook.end_year)?;
        let regions = if workbook.regions.is_empty() {
            self.config.default_regions.clone()
        } else {
            workbook.regions.clone()
        };
        info!(
            workbook_id,
            commit,
            variations = workbook.variations.len(),
            "workbook resolved"
        );

        let mut jobs = Vec::new();
        for variation_path in &workbook.variations {
            jobs.extend(self.variation_jobs(variation_path, years).await?);
        }

        let mut report = CalculationReport {
            technologies: jobs.len(),
            ..CalculationReport::default()
        };
        let mut manifest = Manifest::with_capacity(jobs.len());
        let mut misses = Vec::new();
        for job in jobs {
            if self.cache.get_result(&job.key).await?.is_some() {
                manifest.push(self.manifest_entry(&job));
            } else {
                misses.push(job);
            }
        }
        report.cache_hits = manifest.len();
        report.computed = misses.len();
        info!(
            hits = report.cache_hits,
            misses = report.computed,
            "scheduling technology calculations"
        );

        let outcomes = join_all(misses.iter().map(|job| self.compute(job, &regions))).await;
        for (job, outcome) in misses.iter().zip(outcomes) {
            if !outcome? {
                report.incomplete += 1;
            }
            manifest.push(self.manifest_entry(job));
        }

        self.cache.set_manifest(&commit_key, &manifest).await?;
        info!(workbook_id, commit, entries = manifest.len(), "commit manifest stored");
        Ok((manifest, report))
    }

    async fn variation_jobs(&self, path: &str, years: ReportYears) -> CoreResult<Vec<Job>> {
        let resolved = resolve_variation(&*self.fetcher, path).await?;
        let scenario_name = resolved
            .patch
            .name
            .clone()
            .unwrap_or_else(|| path.to_string());
        let technologies = self.config.calculated_technologies(&resolved.scenario);
        debug!(variation = path, technologies = technologies.len(), "variation resolved");

        let mut jobs = Vec::with_capacity(technologies.len());
        for technology in technologies {
            let record = self.rehydrator.rehydrate(
                years,
                technology,
                &resolved.scenario,
                &resolved.reference,
                &resolved.overrides,
            );
            if record.is_empty() {
                warn!(variation = path, technology, "no parameters found, skipping");
                continue;
            }
            let key = self.cache.key_for(&record)?;
            jobs.push(Job {
                key,
                record,
                scenario_name: scenario_name.clone(),
            });
        }
        Ok(jobs)
    }

    /// Run, serialize and store one record; `Ok(false)` if a field failed
    async fn compute(&self, job: &Job, regions: &[Region]) -> CoreResult<bool> {
        let technology = &job.record.technology;
        debug!(technology = %technology, key = %job.key.short(), "computing scenario");
        let scenario = self.calculator.run(&job.record, &job.scenario_name).await?;
        let json = to_json(scenario.as_ref(), regions);
        for (field, error) in &json.errors {
            warn!(technology = %technology, field = %field, error = %error, "field serialized as null");
        }
        let complete = json.is_complete();
        self.cache.set_result(&job.key, &json.into_cached()).await?;
        Ok(complete)
    }

    fn manifest_entry(&self, job: &Job) -> ManifestEntry {
        let technology = job.record.technology.clone();
        let technology_full = self
            .rehydrator
            .catalog()
            .full_name(&technology)
            .unwrap_or(technology.as_str())
            .to_string();
        ManifestEntry {
            technology,
            technology_full,
            path: ContentCache::result_path(&job.key),
        }
    }
}
