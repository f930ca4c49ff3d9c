//! Resource types read by the calculation core

use dd_params::{unflatten, Branch, Overlay, PathError, Region};
use serde::{Deserialize, Serialize};

/// Top-level user-editable unit: variations plus a reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    /// Regions to report; empty means the configured default
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Resource paths of the workbook's variations
    #[serde(default)]
    pub variations: Vec<String>,
}

impl Workbook {
    /// Resource path a workbook is fetched from
    #[must_use]
    pub fn resource_path(id: &str) -> String {
        format!("workbook/{id}")
    }
}

/// Named bundle of overrides on a scenario / reference pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub scenario_parent_path: String,
    pub reference_parent_path: String,
    #[serde(default)]
    pub scenario_vars: Branch,
    #[serde(default)]
    pub reference_vars: Branch,
}

impl VariationPatch {
    /// Create a patch with empty overrides
    #[must_use]
    pub fn new(scenario_parent_path: impl Into<String>, reference_parent_path: impl Into<String>) -> Self {
        Self {
            name: None,
            scenario_parent_path: scenario_parent_path.into(),
            reference_parent_path: reference_parent_path.into(),
            scenario_vars: Branch::new(),
            reference_vars: Branch::new(),
        }
    }

    /// Build a patch from dotted-path edits, as an editor records them
    ///
    /// # Errors
    /// Returns [`PathError`] if an edit path is malformed or lies below
    /// another edit's leaf.
    pub fn from_flat_edits(
        scenario_parent_path: impl Into<String>,
        reference_parent_path: impl Into<String>,
        scenario_edits: &Overlay,
        reference_edits: &Overlay,
    ) -> Result<Self, PathError> {
        Ok(Self::new(scenario_parent_path, reference_parent_path)
            .with_scenario_vars(unflatten(scenario_edits)?)
            .with_reference_vars(unflatten(reference_edits)?))
    }

    /// With a display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With scenario overrides
    #[inline]
    #[must_use]
    pub fn with_scenario_vars(mut self, vars: Branch) -> Self {
        self.scenario_vars = vars;
        self
    }

    /// With reference overrides
    #[inline]
    #[must_use]
    pub fn with_reference_vars(mut self, vars: Branch) -> Self {
        self.reference_vars = vars;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_params::{address, Leaf};
    use serde_json::json;

    #[test]
    fn workbook_defaults() {
        let wb: Workbook = serde_json::from_value(json!({
            "id": "7", "start_year": 2020, "end_year": 2050
        }))
        .unwrap();
        assert!(wb.regions.is_empty());
        assert!(wb.variations.is_empty());
        assert_eq!(Workbook::resource_path(&wb.id), "workbook/7");
    }

    #[test]
    fn variation_overrides_parse_as_trees() {
        let patch: VariationPatch = serde_json::from_value(json!({
            "scenario_parent_path": "scenario/1",
            "reference_parent_path": "reference/1",
            "scenario_vars": {
                "technologies": {"nuclear": {"first_cost": {"value": 3.0, "statistic": ""}}}
            }
        }))
        .unwrap();
        assert!(patch.reference_vars.is_empty());
        assert!(matches!(
            address::get_leaf(&patch.scenario_vars, "technologies.nuclear.first_cost"),
            Some(Leaf::Stat(_))
        ));
    }

    #[test]
    fn flat_edits_become_nested_overrides() {
        let mut scenario = Overlay::new();
        scenario.insert(
            "technologies.nuclear.first_cost".into(),
            Leaf::Stat(dd_params::StatRecord::plain(4000.0)),
        );
        scenario.insert("technologies.nuclear.lifetime_replacement".into(), Leaf::integer(30));
        let mut reference = Overlay::new();
        reference.insert("technologies.nuclear.adoption_basis".into(), Leaf::text("Default"));

        let patch =
            VariationPatch::from_flat_edits("scenario/1", "reference/1", &scenario, &reference)
                .unwrap();
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({
                "scenario_parent_path": "scenario/1",
                "reference_parent_path": "reference/1",
                "scenario_vars": {"technologies": {"nuclear": {
                    "first_cost": {"value": 4000.0, "statistic": ""},
                    "lifetime_replacement": 30
                }}},
                "reference_vars": {"technologies": {"nuclear": {"adoption_basis": "Default"}}}
            })
        );
    }

    #[test]
    fn conflicting_flat_edits_rejected() {
        let mut scenario = Overlay::new();
        scenario.insert("technologies.nuclear".into(), Leaf::text("x"));
        scenario.insert("technologies.nuclear.first_cost".into(), Leaf::number(1.0));
        let err = VariationPatch::from_flat_edits("s", "r", &scenario, &Overlay::new()).unwrap_err();
        assert!(matches!(err, PathError::NotABranch { .. }));
    }

    #[test]
    fn name_only_serialized_when_set() {
        let patch = VariationPatch::new("scenario/1", "reference/1");
        let value = serde_json::to_value(&patch).unwrap();
        assert!(value.get("name").is_none());
        let named = serde_json::to_value(patch.with_name("Plausible")).unwrap();
        assert_eq!(named["name"], "Plausible");
    }
}
