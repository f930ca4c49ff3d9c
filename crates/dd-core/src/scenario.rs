//! Scenario calculator contract and result serialization
//!
//! The numeric model is external. It is reached through
//! [`ScenarioCalculator`], which turns a [`TechnologyRecord`] into a
//! [`Scenario`] exposing named data fields. [`to_json`] serializes those
//! fields for the cache, reporting per-field failures instead of aborting.

use crate::error::{CoreResult, SerializationError};
use async_trait::async_trait;
use dd_cache::CachedResult;
use dd_catalog::TechnologyRecord;
use dd_params::Region;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Value of one scenario data field
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioData {
    /// Single number
    Scalar(f64),
    /// Year → value
    Series(BTreeMap<i32, f64>),
    /// Year → region → value
    Regional(BTreeMap<i32, BTreeMap<Region, f64>>),
    /// Already serialized output
    Json(Value),
}

/// Computed scenario of one technology
pub trait Scenario: Send + Sync {
    /// Scenario name
    fn name(&self) -> &str;

    /// Names of the data-producing fields, in report order
    fn data_fields(&self) -> Vec<String>;

    /// Read one data field
    ///
    /// # Errors
    /// Returns [`SerializationError`] if the field is unknown or cannot be
    /// produced
    fn read(&self, field: &str) -> Result<ScenarioData, SerializationError>;
}

/// External numeric model
#[async_trait]
pub trait ScenarioCalculator: Send + Sync {
    /// Compute the scenario for one technology record
    async fn run(&self, record: &TechnologyRecord, scenario_name: &str) -> CoreResult<Box<dyn Scenario>>;
}

/// Serialized scenario plus the fields that failed
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioJson {
    pub name: String,
    /// Field → output; `null` where reading failed
    pub data: Map<String, Value>,
    /// Field → why it is `null` in `data`
    pub errors: BTreeMap<String, SerializationError>,
}

impl ScenarioJson {
    /// Check whether every field serialized
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Cached form, `{name, data}`
    #[must_use]
    pub fn into_cached(self) -> CachedResult {
        CachedResult {
            name: self.name,
            data: self.data,
        }
    }
}

/// Serialize every data field of a scenario
///
/// Non-finite numbers become 0 and regional tables keep only `regions`. A
/// field that fails to read is written as `null` and its error recorded.
#[must_use]
pub fn to_json(scenario: &dyn Scenario, regions: &[Region]) -> ScenarioJson {
    let mut data = Map::new();
    let mut errors = BTreeMap::new();
    for field in scenario.data_fields() {
        match scenario.read(&field) {
            Ok(value) => {
                data.insert(field, data_to_json(value, regions));
            }
            Err(e) => {
                data.insert(field.clone(), Value::Null);
                errors.insert(field, e);
            }
        }
    }
    ScenarioJson {
        name: scenario.name().to_string(),
        data,
        errors,
    }
}

fn data_to_json(data: ScenarioData, regions: &[Region]) -> Value {
    match data {
        ScenarioData::Scalar(n) => finite(n),
        ScenarioData::Series(series) => Value::Object(
            series
                .into_iter()
                .map(|(year, n)| (year.to_string(), finite(n)))
                .collect(),
        ),
        ScenarioData::Regional(table) => Value::Object(
            table
                .into_iter()
                .map(|(year, row)| {
                    let row: Map<String, Value> = row
                        .into_iter()
                        .filter(|(region, _)| regions.contains(region))
                        .map(|(region, n)| (region.as_str().to_string(), finite(n)))
                        .collect();
                    (year.to_string(), Value::Object(row))
                })
                .collect(),
        ),
        ScenarioData::Json(value) => value,
    }
}

fn finite(n: f64) -> Value {
    let n = if n.is_finite() { n } else { 0.0 };
    Number::from_f64(n).map_or(Value::from(0), Value::Number)
}
