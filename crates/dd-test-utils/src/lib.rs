//! Testing utilities for the drawdown calculation workspace
//!
//! Shared fixtures: an in-memory resource store, a counting calculator and a
//! small workbook over four technologies.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::DashMap;
use dd_cache::{ContentCache, MemoryStore};
use dd_catalog::{Catalog, LegacyRehydrator, ReportYears, TechnologyRecord};
use dd_core::{
    CalculationOrchestrator, CoreConfig, CoreError, CoreResult, Resource, ResourceFetcher,
    Scenario, ScenarioCalculator, ScenarioData, SerializationError, VariationPatch,
    VariationValidator,
};
use dd_params::{tree_from_json, Branch, Leaf, Region};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const WORKBOOK_ID: &str = "1";
pub const VARIATION_PATH: &str = "variation/1";
pub const SCENARIO_PATH: &str = "scenario/1";
pub const REFERENCE_PATH: &str = "reference/1";

/// Technologies in the fixture scenario tree
pub const FIXTURE_TECHNOLOGIES: [&str; 4] =
    ["fossilfuelelectricity", "nuclear", "solarpvutil", "windonshore"];

/// Resource store keyed by path, holding `data` values
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    resources: DashMap<String, Value>,
    fetches: AtomicUsize,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store populated with the fixture workbook and its parents
    pub fn with_fixtures() -> Self {
        let fetcher = Self::new();
        fetcher.insert(format!("workbook/{WORKBOOK_ID}"), workbook_json(&[VARIATION_PATH]));
        fetcher.insert(VARIATION_PATH, variation_json());
        fetcher.insert(SCENARIO_PATH, scenario_json());
        fetcher.insert(REFERENCE_PATH, reference_json());
        fetcher
    }

    pub fn insert(&self, path: impl Into<String>, data: Value) {
        self.resources.insert(path.into(), data);
    }

    pub fn remove(&self, path: &str) {
        self.resources.remove(path);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for InMemoryFetcher {
    async fn fetch(&self, path: &str) -> CoreResult<Option<Resource>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.resources.get(path).map(|data| Resource {
            data: data.value().clone(),
        }))
    }
}

/// Calculator recording every technology it is asked to run
#[derive(Debug, Default)]
pub struct CountingCalculator {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    failing: Option<String>,
    broken_field: bool,
}

impl CountingCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every run of `technology`
    pub fn failing_on(technology: impl Into<String>) -> Self {
        Self {
            failing: Some(technology.into()),
            ..Self::default()
        }
    }

    /// Produce scenarios with one unreadable field
    pub fn with_broken_field() -> Self {
        Self {
            broken_field: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Technologies run so far, sorted
    pub fn seen(&self) -> Vec<String> {
        let mut seen = self.seen.lock().clone();
        seen.sort();
        seen
    }
}

#[async_trait]
impl ScenarioCalculator for CountingCalculator {
    async fn run(
        &self,
        record: &TechnologyRecord,
        scenario_name: &str,
    ) -> CoreResult<Box<dyn Scenario>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(record.technology.clone());
        if self.failing.as_deref() == Some(record.technology.as_str()) {
            return Err(CoreError::calculation(&record.technology, "model diverged"));
        }
        Ok(Box::new(FixtureScenario::from_record(
            record,
            scenario_name,
            self.broken_field,
        )))
    }
}

/// Scenario whose outputs derive from the record's first cost
#[derive(Debug, Clone)]
pub struct FixtureScenario {
    name: String,
    first_cost: f64,
    years: (i32, i32),
    broken_field: bool,
}

impl FixtureScenario {
    pub fn from_record(record: &TechnologyRecord, name: &str, broken_field: bool) -> Self {
        let first_cost = match record.get("pds_2014_cost") {
            Some(Leaf::Stat(stat)) => stat.value,
            Some(leaf) => leaf.as_number().unwrap_or(0.0),
            None => 0.0,
        };
        Self {
            name: name.to_string(),
            first_cost,
            years: (record.report_start_year, record.report_end_year),
            broken_field,
        }
    }
}

impl Scenario for FixtureScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_fields(&self) -> Vec<String> {
        let mut fields = vec![
            "implementation_unit_adoption".to_string(),
            "install_cost_per_iunit".to_string(),
            "soln_net_annual_funits".to_string(),
        ];
        if self.broken_field {
            fields.push("marginal_first_cost".to_string());
        }
        fields
    }

    fn read(&self, field: &str) -> Result<ScenarioData, SerializationError> {
        let (start, end) = self.years;
        match field {
            "install_cost_per_iunit" => Ok(ScenarioData::Scalar(self.first_cost)),
            "implementation_unit_adoption" => Ok(ScenarioData::Series(
                (start..=end)
                    .map(|year| (year, f64::from(year - start)))
                    .collect(),
            )),
            "soln_net_annual_funits" => Ok(ScenarioData::Regional(BTreeMap::from([(
                start,
                Region::ALL.iter().map(|r| (*r, 1.0)).collect(),
            )]))),
            "marginal_first_cost" => Err(SerializationError::unreadable(field, "division by zero")),
            other => Err(SerializationError::UnknownField(other.to_string())),
        }
    }
}

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().unwrap())
}

pub fn years() -> ReportYears {
    ReportYears::new(2020, 2050).unwrap()
}

pub fn workbook_json(variations: &[&str]) -> Value {
    json!({
        "id": WORKBOOK_ID,
        "name": "Drawdown 2020",
        "start_year": 2020,
        "end_year": 2050,
        "regions": ["World", "USA"],
        "variations": variations,
    })
}

pub fn variation_json() -> Value {
    json!({
        "name": "Plausible",
        "scenario_parent_path": SCENARIO_PATH,
        "reference_parent_path": REFERENCE_PATH,
        "scenario_vars": {
            "technologies": {
                "solarpvutil": {"first_cost": {"value": 900.0, "statistic": ""}}
            }
        },
        "reference_vars": {}
    })
}

pub fn scenario_json() -> Value {
    json!({
        "technologies": {
            "fossilfuelelectricity": {
                "adoption_basis": "Linear",
                "first_cost": {"value": 2.0, "statistic": ""}
            },
            "nuclear": {
                "adoption_basis": "Bass Diffusion S-Curve",
                "adoption_s_curve_innovation": {"World": 0.01, "USA": 0.002},
                "adoption_s_curve_imitation": {"World": 0.3, "USA": 0.1},
                "first_cost": {"value": 4500.0, "statistic": "mean"},
                "npv_discount_rate": 0.04
            },
            "solarpvutil": {
                "adoption_basis": "Linear",
                "first_cost": {"value": 1000.0, "statistic": "mean"},
                "fixed_oam": {"value": 12.5, "statistic": ""},
                "land_allocation": {"World": 0.3, "China": 0.1},
                "vma_source_data": [{"source": "IEA 2017", "value": 1010.0}]
            },
            "windonshore": {
                "adoption_basis": "Existing Adoption Prognostications",
                "adoption_prognostication_source": "Based on IEA (2016)",
                "adoption_prognostication_trend": "3rd Poly",
                "adoption_prognostication_growth": "Medium",
                "first_cost": {"value": 1600.0, "statistic": "mean"}
            }
        }
    })
}

pub fn reference_json() -> Value {
    let technologies: serde_json::Map<String, Value> = FIXTURE_TECHNOLOGIES
        .iter()
        .map(|t| {
            (
                (*t).to_string(),
                json!({
                    "adoption_basis": "Default",
                    "conventional_first_cost": {"value": 2000.0, "statistic": "mean"},
                    "base_adoption": {"World": 100.0}
                }),
            )
        })
        .collect();
    json!({"technologies": technologies})
}

pub fn tree(value: Value) -> Branch {
    tree_from_json(value).unwrap()
}

/// Variation over the fixture parents with the given overrides
pub fn patch(scenario_vars: Value, reference_vars: Value) -> VariationPatch {
    VariationPatch::new(SCENARIO_PATH, REFERENCE_PATH)
        .with_scenario_vars(tree(scenario_vars))
        .with_reference_vars(tree(reference_vars))
}

/// Orchestrator over a fresh in-memory store
pub fn orchestrator(
    fetcher: Arc<InMemoryFetcher>,
    calculator: Arc<CountingCalculator>,
) -> CalculationOrchestrator {
    orchestrator_with_store(fetcher, calculator, Arc::new(MemoryStore::new()))
}

pub fn orchestrator_with_store(
    fetcher: Arc<InMemoryFetcher>,
    calculator: Arc<CountingCalculator>,
    store: Arc<MemoryStore>,
) -> CalculationOrchestrator {
    let catalog = catalog();
    let config = CoreConfig::default();
    let cache = Arc::new(config.content_cache(store, &catalog));
    CalculationOrchestrator::new(
        fetcher,
        calculator,
        cache,
        LegacyRehydrator::new(catalog),
        config,
    )
}

pub fn validator(fetcher: Arc<InMemoryFetcher>) -> VariationValidator {
    VariationValidator::new(
        fetcher,
        LegacyRehydrator::new(catalog()),
        CoreConfig::default(),
    )
}

/// Content cache configured as the orchestrator's, for keying records
pub fn content_cache(store: Arc<MemoryStore>) -> ContentCache {
    CoreConfig::default().content_cache(store, &catalog())
}

pub fn technologies(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}
