//! Dotted paths and technology path templates
//!
//! Provides [`TreePath`] for addressing nodes of a parameter tree and
//! [`PathTemplate`] for canonical paths authored once for every technology.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Placeholder segment standing for the technology name in a template
pub const TECHNOLOGY_SLOT: &str = "{technology}";

/// Path within a parameter tree
///
/// # Examples
/// - `["technologies", "solarpvutil", "lifetime"]` → `technologies.solarpvutil.lifetime`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path made of the first `len` segments
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl Display for TreePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for TreePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// One segment of a [`PathTemplate`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSegment {
    /// Matches exactly this text
    Literal(String),
    /// Stands for the technology name
    TechnologySlot,
}

/// Canonical path authored against a technology placeholder
///
/// Written as `technologies.{technology}.lifetime`. The placeholder is a
/// segment of its own, so instantiating never rewrites text inside other
/// segments, whatever the technology is called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate(Vec<TemplateSegment>);

impl PathTemplate {
    /// Create template from segments
    ///
    /// # Errors
    /// Returns error if more than one segment is a technology slot
    pub fn new(segments: Vec<TemplateSegment>) -> Result<Self, PathError> {
        let slots = segments
            .iter()
            .filter(|s| matches!(s, TemplateSegment::TechnologySlot))
            .count();
        if slots > 1 {
            return Err(PathError::MultipleSlots(
                Self(segments).to_string(),
            ));
        }
        Ok(Self(segments))
    }

    /// Template segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.0
    }

    /// Whether the template addresses every technology
    #[inline]
    #[must_use]
    pub fn has_slot(&self) -> bool {
        self.0
            .iter()
            .any(|s| matches!(s, TemplateSegment::TechnologySlot))
    }

    /// Final literal segment, the field's short name
    #[inline]
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self.0.last() {
            Some(TemplateSegment::Literal(s)) => s,
            Some(TemplateSegment::TechnologySlot) => TECHNOLOGY_SLOT,
            None => "",
        }
    }

    /// Concrete path for one technology
    #[must_use]
    pub fn instantiate(&self, technology: &str) -> TreePath {
        TreePath(
            self.0
                .iter()
                .map(|s| match s {
                    TemplateSegment::Literal(lit) => lit.clone(),
                    TemplateSegment::TechnologySlot => technology.to_string(),
                })
                .collect(),
        )
    }

    /// Check if a concrete path is an instance of this template
    #[inline]
    #[must_use]
    pub fn matches(&self, path: &TreePath) -> bool {
        self.0.len() == path.0.len()
            && self.0.iter().zip(&path.0).all(|(t, p)| match t {
                TemplateSegment::Literal(lit) => lit == p,
                TemplateSegment::TechnologySlot => true,
            })
    }

    /// Technology a concrete path addresses through this template
    ///
    /// `None` if the path does not match or the template has no slot.
    #[must_use]
    pub fn capture<'a>(&self, path: &'a TreePath) -> Option<&'a str> {
        if !self.matches(path) {
            return None;
        }
        self.0
            .iter()
            .position(|s| matches!(s, TemplateSegment::TechnologySlot))
            .map(|i| path.0[i].as_str())
    }
}

impl Display for PathTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|s| match s {
                TemplateSegment::Literal(lit) => lit.as_str(),
                TemplateSegment::TechnologySlot => TECHNOLOGY_SLOT,
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for PathTemplate {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path: TreePath = s.parse()?;
        if path.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let segments = path
            .0
            .into_iter()
            .map(|seg| {
                if seg == TECHNOLOGY_SLOT {
                    TemplateSegment::TechnologySlot
                } else {
                    TemplateSegment::Literal(seg)
                }
            })
            .collect();
        Self::new(segments)
    }
}

impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to tree paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Operation needs at least one segment
    #[error("path is empty")]
    EmptyPath,

    /// Intermediate segment is a leaf, so nothing can be stored below it
    #[error("'{path}' is a leaf, not a branch")]
    NotABranch { path: String },

    /// Template with more than one technology placeholder
    #[error("template '{0}' has more than one technology slot")]
    MultipleSlots(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_str_valid() {
        let path: TreePath = "technologies.solarpvutil.lifetime".parse().unwrap();
        assert_eq!(path.segments(), &["technologies", "solarpvutil", "lifetime"]);
        assert_eq!(path.to_string(), "technologies.solarpvutil.lifetime");
    }

    #[test]
    fn path_from_str_empty() {
        let path: TreePath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<TreePath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn path_prefix() {
        let path: TreePath = "a.b.c".parse().unwrap();
        assert_eq!(path.prefix(2).to_string(), "a.b");
        assert_eq!(path.prefix(9), path);
        assert_eq!(path.prefix(0), TreePath::root());
    }

    #[test]
    fn template_instantiate() {
        let template: PathTemplate = "technologies.{technology}.lifetime".parse().unwrap();
        assert!(template.has_slot());
        assert_eq!(
            template.instantiate("afforestation").to_string(),
            "technologies.afforestation.lifetime"
        );
        assert_eq!(template.field_name(), "lifetime");
    }

    #[test]
    fn template_instantiate_does_not_touch_other_segments() {
        // A technology named like a literal segment must not rewrite it.
        let template: PathTemplate = "technologies.{technology}.technologies".parse().unwrap();
        let path = template.instantiate("technologies");
        assert_eq!(path.to_string(), "technologies.technologies.technologies");
    }

    #[test]
    fn template_capture() {
        let template: PathTemplate = "technologies.{technology}.lifetime".parse().unwrap();
        let path: TreePath = "technologies.bikeinfrastructure.lifetime".parse().unwrap();
        assert_eq!(template.capture(&path), Some("bikeinfrastructure"));

        let other: TreePath = "technologies.bikeinfrastructure.cost".parse().unwrap();
        assert_eq!(template.capture(&other), None);
    }

    #[test]
    fn template_without_slot_matches_exactly() {
        let template: PathTemplate = "technologies.solarpvutil.lifetime".parse().unwrap();
        assert!(!template.has_slot());
        assert!(template.matches(&"technologies.solarpvutil.lifetime".parse().unwrap()));
        assert!(!template.matches(&"technologies.windonshore.lifetime".parse().unwrap()));
        assert_eq!(
            template.capture(&"technologies.solarpvutil.lifetime".parse().unwrap()),
            None
        );
    }

    #[test]
    fn template_rejects_two_slots() {
        let result: Result<PathTemplate, _> = "{technology}.x.{technology}".parse();
        assert!(matches!(result, Err(PathError::MultipleSlots(_))));
    }

    #[test]
    fn template_serde_as_string() {
        let template: PathTemplate = "a.{technology}.b".parse().unwrap();
        let json = serde_json::to_string(&template).unwrap();
        assert_eq!(json, "\"a.{technology}.b\"");
        let back: PathTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, template);
    }
}
