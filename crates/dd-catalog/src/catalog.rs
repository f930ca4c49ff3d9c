//! Legacy path catalogs and per-path shape schema
//!
//! The catalog is immutable configuration: loaded once, shared behind an
//! `Arc`, and handed explicitly to the rehydrator and the validation engine.

use crate::error::{CatalogError, CatalogResult};
use crate::rules::{FieldRule, RuleMatrix};
use dd_params::{Leaf, Overlay, PathTemplate, Scalar, TreePath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// Catalog shipped with the crate
const BUILTIN_CATALOG: &str = include_str!("../config/catalog.yaml");

/// Leaf shape an override may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Float,
    Str,
    Bool,
    RegionMap,
    Stat,
    List,
}

impl Shape {
    /// Check whether `leaf` has this shape
    #[must_use]
    pub fn accepts(&self, leaf: &Leaf) -> bool {
        matches!(
            (self, leaf),
            (Shape::Float, Leaf::Scalar(Scalar::Number(_)))
                | (Shape::Str, Leaf::Scalar(Scalar::Text(_)))
                | (Shape::Bool, Leaf::Scalar(Scalar::Bool(_)))
                | (Shape::RegionMap, Leaf::Regional(_))
                | (Shape::Stat, Leaf::Stat(_))
                | (Shape::List, Leaf::Array(_))
        )
    }

    /// Human-readable name used in rejection messages
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Shape::Float => "float",
            Shape::Str => "str",
            Shape::Bool => "bool",
            Shape::RegionMap => "region map",
            Shape::Stat => "{value: float, statistic: str}",
            Shape::List => "list",
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Which base tree a catalog entry reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Solution (PDS) parameters
    Scenario,
    /// Reference (business as usual) parameters
    Reference,
}

impl Scope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scope::Scenario => "scenario",
            Scope::Reference => "reference",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One legacy field and where it lives in the parameter tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Field name in the flat legacy record
    pub legacy: String,
    /// Canonical path in the parameter tree
    pub path: PathTemplate,
    /// Accepted override shapes, in preference order
    pub shapes: Vec<Shape>,
    /// Leave this field out of the cache key
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cache_exempt: bool,
    /// Restrict the entry to one technology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

impl CatalogEntry {
    /// Check whether the entry contributes to `technology`'s record
    #[inline]
    #[must_use]
    pub fn applies_to(&self, technology: &str) -> bool {
        self.technology.as_deref().map_or(true, |t| t == technology)
    }

    /// Check whether `leaf` has one of the accepted shapes
    #[inline]
    #[must_use]
    pub fn accepts(&self, leaf: &Leaf) -> bool {
        self.shapes.iter().any(|shape| shape.accepts(leaf))
    }

    /// Accepted shapes joined for messages (`a or b`)
    #[must_use]
    pub fn describe_shapes(&self) -> String {
        self.shapes
            .iter()
            .map(Shape::describe)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Registry record for a known technology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyInfo {
    /// Display name
    pub full_name: String,
}

/// Catalog document as authored
#[derive(Debug, Deserialize)]
struct CatalogFile {
    technologies: BTreeMap<String, TechnologyInfo>,
    #[serde(default)]
    scenario: Vec<CatalogEntry>,
    #[serde(default)]
    reference: Vec<CatalogEntry>,
    rules: RuleMatrix,
}

/// Legacy path catalogs, shape schema, rule matrix and technology registry
#[derive(Debug, Clone)]
pub struct Catalog {
    technologies: BTreeMap<String, TechnologyInfo>,
    scenario: Vec<CatalogEntry>,
    reference: Vec<CatalogEntry>,
    rules: RuleMatrix,
}

impl Catalog {
    /// Load the catalog embedded in this crate
    ///
    /// # Errors
    /// Returns error if the embedded document fails its load-time checks
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parse and check a catalog document
    ///
    /// # Errors
    /// Returns [`CatalogError`] if the document does not parse, declares a
    /// legacy field twice, restricts an entry to an unknown technology, or
    /// has rules pointing at undeclared paths.
    pub fn from_yaml(text: &str) -> CatalogResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(text)?;
        let catalog = Self {
            technologies: file.technologies,
            scenario: file.scenario,
            reference: file.reference,
            rules: file.rules,
        };
        catalog.check()?;
        Ok(catalog)
    }

    fn check(&self) -> CatalogResult<()> {
        for scope in [Scope::Scenario, Scope::Reference] {
            let mut seen = BTreeSet::new();
            for entry in self.entries(scope) {
                if entry.shapes.is_empty() {
                    return Err(CatalogError::invalid_entry(
                        scope.as_str(),
                        &entry.legacy,
                        "no shapes declared",
                    ));
                }
                if entry.shapes.contains(&Shape::Stat) && entry.shapes.contains(&Shape::Float) {
                    return Err(CatalogError::invalid_entry(
                        scope.as_str(),
                        &entry.legacy,
                        "a stat field cannot also accept a bare float",
                    ));
                }
                if let Some(technology) = &entry.technology {
                    if !entry.path.has_slot() {
                        return Err(CatalogError::invalid_entry(
                            scope.as_str(),
                            &entry.legacy,
                            "technology restriction on a path without a technology slot",
                        ));
                    }
                    if !self.is_known(technology) {
                        return Err(CatalogError::invalid_entry(
                            scope.as_str(),
                            &entry.legacy,
                            format!("unknown technology '{technology}'"),
                        ));
                    }
                }
                if !seen.insert((entry.legacy.as_str(), entry.technology.as_deref())) {
                    return Err(CatalogError::DuplicateField {
                        scope: scope.as_str(),
                        legacy: entry.legacy.clone(),
                    });
                }
            }
        }

        self.check_declared(Scope::Scenario, &self.rules.pds_basis)?;
        self.check_declared(Scope::Reference, &self.rules.reference_basis)?;
        for rules in self.rules.pds.values() {
            self.check_rules(Scope::Scenario, rules)?;
        }
        for rules in self.rules.reference.values() {
            self.check_rules(Scope::Reference, rules)?;
        }
        Ok(())
    }

    fn check_rules(&self, scope: Scope, rules: &[FieldRule]) -> CatalogResult<()> {
        for rule in rules {
            self.check_declared(scope, &rule.path)?;
            if rule.values.as_ref().is_some_and(Vec::is_empty) {
                return Err(CatalogError::EmptyValues(rule.path.clone()));
            }
        }
        Ok(())
    }

    fn check_declared(&self, scope: Scope, path: &PathTemplate) -> CatalogResult<()> {
        if self.entries(scope).iter().any(|e| &e.path == path) {
            Ok(())
        } else {
            Err(CatalogError::UnknownRulePath {
                scope: scope.as_str(),
                path: path.clone(),
            })
        }
    }

    /// Entries of one scope, in catalog order
    #[inline]
    #[must_use]
    pub fn entries(&self, scope: Scope) -> &[CatalogEntry] {
        match scope {
            Scope::Scenario => &self.scenario,
            Scope::Reference => &self.reference,
        }
    }

    /// Adoption-basis rule matrix
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RuleMatrix {
        &self.rules
    }

    /// Technology registry
    #[inline]
    #[must_use]
    pub fn technologies(&self) -> &BTreeMap<String, TechnologyInfo> {
        &self.technologies
    }

    /// Check whether a technology is registered
    #[inline]
    #[must_use]
    pub fn is_known(&self, technology: &str) -> bool {
        self.technologies.contains_key(technology)
    }

    /// Display name of a registered technology
    #[must_use]
    pub fn full_name(&self, technology: &str) -> Option<&str> {
        self.technologies
            .get(technology)
            .map(|info| info.full_name.as_str())
    }

    /// Schema entry governing a concrete path
    ///
    /// An exact entry (a literal path, or one restricted to the technology
    /// the path addresses) is preferred over a generic technology-slot entry.
    #[must_use]
    pub fn entry_for(&self, scope: Scope, path: &TreePath) -> Option<&CatalogEntry> {
        let mut generic = None;
        for entry in self.entries(scope) {
            if !entry.path.matches(path) {
                continue;
            }
            match (&entry.technology, entry.path.capture(path)) {
                (Some(only), Some(technology)) if only == technology => return Some(entry),
                (Some(_), _) => {}
                (None, None) => return Some(entry),
                (None, Some(_)) => {
                    generic = generic.or(Some(entry));
                }
            }
        }
        generic
    }

    /// Entries contributing to one technology's record
    ///
    /// Generic entries come first so a technology-specific entry for the same
    /// legacy field is applied last.
    pub fn entries_for<'a>(
        &'a self,
        scope: Scope,
        technology: &'a str,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        let entries = self.entries(scope);
        let generic = entries.iter().filter(|e| e.technology.is_none());
        let specific = entries
            .iter()
            .filter(move |e| e.technology.as_deref() == Some(technology));
        generic.chain(specific)
    }

    /// Legacy field read from `path` for `technology`
    #[must_use]
    pub fn legacy_name<'a>(
        &'a self,
        scope: Scope,
        path: &PathTemplate,
        technology: &'a str,
    ) -> Option<&'a str> {
        self.entries_for(scope, technology)
            .filter(|e| &e.path == path)
            .last()
            .map(|e| e.legacy.as_str())
    }

    /// Technologies addressed by the paths of an overlay
    #[must_use]
    pub fn technologies_in(&self, scope: Scope, overlay: &Overlay) -> BTreeSet<String> {
        overlay
            .keys()
            .filter_map(|raw| raw.parse::<TreePath>().ok())
            .filter_map(|path| {
                self.entries(scope)
                    .iter()
                    .find_map(|e| e.path.capture(&path).map(str::to_string))
            })
            .collect()
    }

    /// Legacy fields left out of cache keys
    #[must_use]
    pub fn cache_exempt_fields(&self) -> BTreeSet<String> {
        self.scenario
            .iter()
            .chain(&self.reference)
            .filter(|e| e.cache_exempt)
            .map(|e| e.legacy.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_params::StatRecord;

    const SMALL: &str = r#"
technologies:
  solarpvutil: {full_name: "Utility Solar"}
  windonshore: {full_name: "Onshore Wind"}
scenario:
  - {legacy: soln_pds_adoption_basis, path: "technologies.{technology}.adoption_basis", shapes: [str]}
  - {legacy: pds_2014_cost, path: "technologies.{technology}.first_cost", shapes: [stat, region_map]}
  - {legacy: special_cost, path: "technologies.{technology}.first_cost", shapes: [float], technology: solarpvutil}
  - {legacy: vmas, path: "technologies.{technology}.vma_source_data", shapes: [list], cache_exempt: true}
  - {legacy: global_rate, path: "settings.discount_rate", shapes: [float]}
reference:
  - {legacy: soln_ref_adoption_basis, path: "technologies.{technology}.adoption_basis", shapes: [str]}
rules:
  pds_basis: "technologies.{technology}.adoption_basis"
  reference_basis: "technologies.{technology}.adoption_basis"
"#;

    fn small() -> Catalog {
        Catalog::from_yaml(SMALL).unwrap()
    }

    fn path(s: &str) -> TreePath {
        s.parse().unwrap()
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.is_known("solarpvutil"));
        assert!(catalog.is_known("fossilfuelelectricity"));
        assert_eq!(
            catalog.full_name("windonshore"),
            Some("Onshore Wind Turbines")
        );
        assert!(!catalog.entries(Scope::Scenario).is_empty());
        assert!(!catalog.entries(Scope::Reference).is_empty());
        assert!(catalog.cache_exempt_fields().contains("vmas"));
    }

    #[test]
    fn shape_accepts() {
        assert!(Shape::Float.accepts(&Leaf::number(1.0)));
        assert!(!Shape::Float.accepts(&Leaf::text("1")));
        assert!(Shape::Stat.accepts(&Leaf::Stat(StatRecord::plain(1.0))));
        assert!(!Shape::Stat.accepts(&Leaf::number(1.0)));
        assert!(Shape::List.accepts(&Leaf::Array(vec![])));
        assert!(!Shape::Str.accepts(&Leaf::Null));
    }

    #[test]
    fn describe_shapes_joins_alternatives() {
        let catalog = small();
        let entry = catalog
            .entry_for(Scope::Scenario, &path("technologies.windonshore.first_cost"))
            .unwrap();
        assert_eq!(
            entry.describe_shapes(),
            "{value: float, statistic: str} or region map"
        );
    }

    #[test]
    fn exact_entry_wins_over_generic() {
        let catalog = small();
        let specific = catalog
            .entry_for(Scope::Scenario, &path("technologies.solarpvutil.first_cost"))
            .unwrap();
        assert_eq!(specific.legacy, "special_cost");

        let generic = catalog
            .entry_for(Scope::Scenario, &path("technologies.windonshore.first_cost"))
            .unwrap();
        assert_eq!(generic.legacy, "pds_2014_cost");

        let literal = catalog
            .entry_for(Scope::Scenario, &path("settings.discount_rate"))
            .unwrap();
        assert_eq!(literal.legacy, "global_rate");
    }

    #[test]
    fn unknown_path_has_no_entry() {
        let catalog = small();
        assert!(catalog
            .entry_for(Scope::Scenario, &path("technologies.solarpvutil.nonsense"))
            .is_none());
        assert!(catalog
            .entry_for(Scope::Reference, &path("technologies.solarpvutil.first_cost"))
            .is_none());
    }

    #[test]
    fn entries_for_puts_specific_last() {
        let catalog = small();
        let legacy: Vec<&str> = catalog
            .entries_for(Scope::Scenario, "solarpvutil")
            .map(|e| e.legacy.as_str())
            .collect();
        assert_eq!(legacy.last(), Some(&"special_cost"));
        assert!(!catalog
            .entries_for(Scope::Scenario, "windonshore")
            .any(|e| e.legacy == "special_cost"));
    }

    #[test]
    fn legacy_name_prefers_specific_entry() {
        let catalog = small();
        let template: PathTemplate = "technologies.{technology}.first_cost".parse().unwrap();
        let technology = String::from("solarpvutil");
        let legacy = catalog.legacy_name(Scope::Scenario, &template, &technology);
        assert_eq!(legacy, Some("special_cost"));
        assert_eq!(
            catalog.legacy_name(Scope::Scenario, &template, "windonshore"),
            Some("pds_2014_cost")
        );
        assert_eq!(catalog.legacy_name(Scope::Reference, &template, "windonshore"), None);
    }

    #[test]
    fn technologies_in_overlay() {
        let catalog = small();
        let mut overlay = Overlay::new();
        overlay.insert("technologies.solarpvutil.first_cost".into(), Leaf::number(1.0));
        overlay.insert("technologies.windonshore.adoption_basis".into(), Leaf::text("Linear"));
        overlay.insert("settings.discount_rate".into(), Leaf::number(0.04));
        let techs: Vec<String> = catalog
            .technologies_in(Scope::Scenario, &overlay)
            .into_iter()
            .collect();
        assert_eq!(techs, vec!["solarpvutil", "windonshore"]);
    }

    #[test]
    fn duplicate_legacy_rejected() {
        let doc = SMALL.replace("legacy: global_rate", "legacy: pds_2014_cost");
        assert!(matches!(
            Catalog::from_yaml(&doc),
            Err(CatalogError::DuplicateField { .. })
        ));
    }

    #[test]
    fn stat_field_accepting_float_rejected() {
        let doc = SMALL.replace("shapes: [stat, region_map]", "shapes: [stat, float]");
        let err = Catalog::from_yaml(&doc).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEntry { .. }));
        assert!(err.to_string().contains("pds_2014_cost"));
    }

    #[test]
    fn restriction_to_unknown_technology_rejected() {
        let doc = SMALL.replace("technology: solarpvutil", "technology: moonbase");
        assert!(matches!(
            Catalog::from_yaml(&doc),
            Err(CatalogError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn rule_on_undeclared_path_rejected() {
        let doc = format!(
            "{SMALL}  pds:\n    Linear:\n      - path: \"technologies.{{technology}}.nowhere\"\n        required: true\n"
        );
        assert!(matches!(
            Catalog::from_yaml(&doc),
            Err(CatalogError::UnknownRulePath { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        assert!(matches!(
            Catalog::from_yaml("technologies: ["),
            Err(CatalogError::Parse(_))
        ));
    }
}
