//! Override validation
//!
//! Two independent checks, both of which must pass before a variation is
//! attached to a workbook:
//!
//! 1. [`ValidationEngine::validate`]: every override path must exist in the
//!    catalog schema and carry one of the shapes declared for it.
//! 2. [`ValidationEngine::validate_full_schema`]: every rehydrated record
//!    must satisfy the rules of its adoption basis.
//!
//! Rejections are data, never errors; the first one found wins.

use crate::outcome::ValidationOutcome;
use dd_catalog::{
    AdoptionBasis, Catalog, FieldRule, ReferenceBasis, Scope, Shape, TechnologyRecord,
    UnknownBasis,
};
use dd_params::{address, flatten, Branch, Leaf, Node, PathTemplate, StatRecord, TreePath};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Checks overrides against the catalog schema and rule matrix
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    catalog: Arc<Catalog>,
}

impl ValidationEngine {
    /// Create an engine over a loaded catalog
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Shape check over both override trees
    ///
    /// A bare number at a path that accepts a `{value, statistic}` record is
    /// rewritten in place to `{value: n, statistic: ""}`. Null leaves mean
    /// "no override" and are accepted anywhere the schema knows the path.
    pub fn validate(
        &self,
        scenario_vars: &mut Branch,
        reference_vars: &mut Branch,
    ) -> ValidationOutcome {
        for (scope, tree) in [
            (Scope::Scenario, scenario_vars),
            (Scope::Reference, reference_vars),
        ] {
            if let Err(reason) = self.check_tree(scope, tree) {
                debug!(%scope, %reason, "override rejected by shape check");
                return ValidationOutcome::rejected(reason);
            }
        }
        ValidationOutcome::accepted()
    }

    fn check_tree(&self, scope: Scope, tree: &mut Branch) -> Result<(), String> {
        for (raw, leaf) in flatten(tree) {
            let entry = raw
                .parse::<TreePath>()
                .ok()
                .and_then(|path| self.catalog.entry_for(scope, &path).map(|e| (path, e)));
            let Some((path, entry)) = entry else {
                return Err(format!("{raw}: does not exist in schema"));
            };

            if leaf.is_null() {
                continue;
            }
            match leaf.as_number() {
                Some(n) if entry.shapes.contains(&Shape::Stat) => {
                    address::set_at(tree, &path, Node::Leaf(Leaf::Stat(StatRecord::plain(n))))
                        .map_err(|e| format!("{raw}: {e}"))?;
                }
                _ if entry.accepts(&leaf) => {}
                _ => return Err(format!("{raw}: must be {}", entry.describe_shapes())),
            }
        }
        Ok(())
    }

    /// Rule-matrix check over rehydrated records
    ///
    /// A missing scenario basis is a rejection; a missing reference basis
    /// reads as `Default`.
    #[must_use]
    pub fn validate_full_schema(&self, records: &[TechnologyRecord]) -> ValidationOutcome {
        let mut warnings = Vec::new();
        for record in records {
            if let Err(reason) = self.check_record(record, &mut warnings) {
                debug!(technology = %record.technology, %reason, "record rejected by rule matrix");
                return ValidationOutcome::rejected(reason);
            }
        }
        ValidationOutcome::accepted_with(warnings)
    }

    fn check_record(
        &self,
        record: &TechnologyRecord,
        warnings: &mut Vec<String>,
    ) -> Result<(), String> {
        let rules = self.catalog.rules();

        let pds_field = self.field(Scope::Scenario, &rules.pds_basis, record);
        let pds_basis: AdoptionBasis = match pds_field {
            Some(leaf) => parse_basis(rules.pds_basis.field_name(), leaf)?,
            None => return Err(format!("{} missing", rules.pds_basis.field_name())),
        };
        self.apply_rules(Scope::Scenario, rules.pds_rules(pds_basis), pds_basis, record, warnings)?;

        let reference_field = self.field(Scope::Reference, &rules.reference_basis, record);
        let reference_basis: ReferenceBasis = match reference_field {
            Some(leaf) => parse_basis(rules.reference_basis.field_name(), leaf)?,
            None => ReferenceBasis::Default,
        };
        self.apply_rules(
            Scope::Reference,
            rules.reference_rules(reference_basis),
            reference_basis,
            record,
            warnings,
        )
    }

    fn apply_rules(
        &self,
        scope: Scope,
        rules: &[FieldRule],
        basis: impl Display,
        record: &TechnologyRecord,
        warnings: &mut Vec<String>,
    ) -> Result<(), String> {
        for rule in rules {
            let field = rule.field_name();
            let value = self.field(scope, &rule.path, record);
            match value {
                None if rule.required => return Err(format!("{field} missing")),
                None => {}
                Some(leaf) => {
                    if let Some(values) = &rule.values {
                        let got = leaf.display_value();
                        if !values.contains(&got) {
                            return Err(format!(
                                "{field} must be one of [{}], got {got}",
                                values.join(", ")
                            ));
                        }
                    }
                    if rule.warning {
                        warnings.push(format!(
                            "{field} will be overridden by {basis} adoption basis"
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn field<'a>(
        &self,
        scope: Scope,
        path: &PathTemplate,
        record: &'a TechnologyRecord,
    ) -> Option<&'a Leaf> {
        self.catalog
            .legacy_name(scope, path, &record.technology)
            .and_then(|legacy| record.get(legacy))
            .filter(|leaf| !leaf.is_null())
    }
}

fn parse_basis<B>(field: &str, leaf: &Leaf) -> Result<B, String>
where
    B: FromStr<Err = UnknownBasis>,
{
    let text = leaf.display_value();
    text.parse::<B>().map_err(|e| {
        format!(
            "{field} must be one of [{}], got {}",
            e.accepted.join(", "),
            e.value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_catalog::ReportYears;
    use dd_params::tree_from_json;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> ValidationEngine {
        ValidationEngine::new(Arc::new(Catalog::builtin().unwrap()))
    }

    fn tree(value: serde_json::Value) -> Branch {
        tree_from_json(value).unwrap()
    }

    fn record(fields: &[(&str, Leaf)]) -> TechnologyRecord {
        let mut record = TechnologyRecord::new("solarpvutil", ReportYears::new(2020, 2050).unwrap());
        for (name, leaf) in fields {
            record.insert(*name, leaf.clone());
        }
        record
    }

    #[test]
    fn bare_number_coerced_to_stat_record() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"lifetime_capacity": 11.0}}
        }));
        let outcome = engine().validate(&mut scenario, &mut Branch::new());
        assert_eq!(outcome, ValidationOutcome::accepted());
        assert_eq!(
            address::get_leaf(&scenario, "technologies.solarpvutil.lifetime_capacity"),
            Some(&Leaf::Stat(StatRecord {
                value: 11.0,
                statistic: String::new()
            }))
        );
    }

    #[test]
    fn integer_cost_coerced_to_stat_record() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"first_cost": 950}}
        }));
        let outcome = engine().validate(&mut scenario, &mut Branch::new());
        assert_eq!(outcome, ValidationOutcome::accepted());
        assert_eq!(
            address::get_leaf(&scenario, "technologies.solarpvutil.first_cost"),
            Some(&Leaf::Stat(StatRecord::plain(950.0)))
        );
    }

    #[test]
    fn unknown_path_rejected() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"warp_drive": 1.0}}
        }));
        let outcome = engine().validate(&mut scenario, &mut Branch::new());
        assert_eq!(
            outcome.reason.as_deref(),
            Some("technologies.solarpvutil.warp_drive: does not exist in schema")
        );
        assert_eq!(outcome.status_code(), 422);
    }

    #[test]
    fn reference_path_checked_against_reference_schema() {
        let mut reference = tree(json!({
            "technologies": {"solarpvutil": {"first_cost": 1.0}}
        }));
        let outcome = engine().validate(&mut Branch::new(), &mut reference);
        assert!(!outcome.valid);
    }

    #[test]
    fn wrong_shape_lists_alternatives() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"first_cost": "cheap"}}
        }));
        let outcome = engine().validate(&mut scenario, &mut Branch::new());
        assert_eq!(
            outcome.reason.as_deref(),
            Some("technologies.solarpvutil.first_cost: must be {value: float, statistic: str}")
        );
    }

    #[test]
    fn number_not_coerced_where_no_stat_shape() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"adoption_basis": 3.0}}
        }));
        let outcome = engine().validate(&mut scenario, &mut Branch::new());
        assert_eq!(
            outcome.reason.as_deref(),
            Some("technologies.solarpvutil.adoption_basis: must be str")
        );
    }

    #[test]
    fn null_override_accepted() {
        let mut scenario = tree(json!({
            "technologies": {"solarpvutil": {"first_cost": null}}
        }));
        assert!(engine().validate(&mut scenario, &mut Branch::new()).valid);
    }

    #[test]
    fn technology_specific_path_only_for_its_technology() {
        let mut ok = tree(json!({
            "technologies": {"solarpvutil": {"land_allocation": {"World": 1.0}}}
        }));
        assert!(engine().validate(&mut ok, &mut Branch::new()).valid);

        let mut bad = tree(json!({
            "technologies": {"windonshore": {"land_allocation": {"World": 1.0}}}
        }));
        assert!(!engine().validate(&mut bad, &mut Branch::new()).valid);
    }

    #[test]
    fn missing_pds_basis_rejected() {
        let outcome = engine().validate_full_schema(&[record(&[])]);
        assert_eq!(outcome.reason.as_deref(), Some("adoption_basis missing"));
    }

    #[test]
    fn unknown_basis_names_accepted_values() {
        let outcome = engine().validate_full_schema(&[record(&[(
            "soln_pds_adoption_basis",
            Leaf::text("Hunch"),
        )])]);
        let reason = outcome.reason.unwrap();
        assert!(reason.starts_with("adoption_basis must be one of [Linear, "));
        assert!(reason.ends_with("got Hunch"));
    }

    #[test]
    fn warning_field_present_adds_warning() {
        let outcome = engine().validate_full_schema(&[record(&[
            ("soln_pds_adoption_basis", Leaf::text("Linear")),
            ("soln_pds_adoption_custom_name", Leaf::text("My curve")),
        ])]);
        assert!(outcome.valid);
        assert_eq!(
            outcome.warnings,
            vec!["adoption_custom_name will be overridden by Linear adoption basis"]
        );
    }

    #[test]
    fn custom_reference_basis_requires_custom_name() {
        let outcome = engine().validate_full_schema(&[record(&[
            ("soln_pds_adoption_basis", Leaf::text("Linear")),
            ("soln_ref_adoption_basis", Leaf::text("Custom")),
        ])]);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("adoption_custom_name missing")
        );
    }

    #[test]
    fn first_rejection_wins() {
        let mut good = record(&[("soln_pds_adoption_basis", Leaf::text("Linear"))]);
        good.technology = "windonshore".into();
        let bad = record(&[]);
        let outcome = engine().validate_full_schema(&[good, bad]);
        assert_eq!(outcome.reason.as_deref(), Some("adoption_basis missing"));
    }
}
