//! Adoption-basis rule matrix
//!
//! A technology's adoption basis decides which of its fields are required,
//! which are constrained to an enumeration, and which will be ignored (and
//! so earn a warning when set).

use dd_params::PathTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Methodology deriving the PDS adoption curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdoptionBasis {
    #[serde(rename = "Linear")]
    Linear,
    #[serde(rename = "Existing Adoption Prognostications")]
    ExistingAdoptionPrognostications,
    #[serde(rename = "Fully Customized PDS")]
    FullyCustomizedPds,
    #[serde(rename = "Bass Diffusion S-Curve")]
    BassDiffusionSCurve,
    #[serde(rename = "Logistic S-Curve")]
    LogisticSCurve,
    #[serde(rename = "Customized S-Curve Adoption")]
    CustomizedSCurveAdoption,
}

impl AdoptionBasis {
    /// Every basis, in declaration order
    pub const ALL: [AdoptionBasis; 6] = [
        AdoptionBasis::Linear,
        AdoptionBasis::ExistingAdoptionPrognostications,
        AdoptionBasis::FullyCustomizedPds,
        AdoptionBasis::BassDiffusionSCurve,
        AdoptionBasis::LogisticSCurve,
        AdoptionBasis::CustomizedSCurveAdoption,
    ];

    /// Name as written in parameter trees
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AdoptionBasis::Linear => "Linear",
            AdoptionBasis::ExistingAdoptionPrognostications => "Existing Adoption Prognostications",
            AdoptionBasis::FullyCustomizedPds => "Fully Customized PDS",
            AdoptionBasis::BassDiffusionSCurve => "Bass Diffusion S-Curve",
            AdoptionBasis::LogisticSCurve => "Logistic S-Curve",
            AdoptionBasis::CustomizedSCurveAdoption => "Customized S-Curve Adoption",
        }
    }
}

impl Display for AdoptionBasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdoptionBasis {
    type Err = UnknownBasis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownBasis {
                value: s.to_string(),
                accepted: Self::ALL.iter().map(|b| b.as_str()).collect(),
            })
    }
}

/// Methodology deriving the reference adoption curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceBasis {
    Default,
    Custom,
}

impl ReferenceBasis {
    /// Every basis, in declaration order
    pub const ALL: [ReferenceBasis; 2] = [ReferenceBasis::Default, ReferenceBasis::Custom];

    /// Name as written in parameter trees
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReferenceBasis::Default => "Default",
            ReferenceBasis::Custom => "Custom",
        }
    }
}

impl Display for ReferenceBasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceBasis {
    type Err = UnknownBasis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownBasis {
                value: s.to_string(),
                accepted: Self::ALL.iter().map(|b| b.as_str()).collect(),
            })
    }
}

/// Text that names no known adoption basis
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not an adoption basis (expected one of {accepted:?})")]
pub struct UnknownBasis {
    pub value: String,
    pub accepted: Vec<&'static str>,
}

/// Constraint on one field under one basis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Canonical path of the constrained field
    pub path: PathTemplate,
    /// Field must be present
    #[serde(default)]
    pub required: bool,
    /// Accepted values, when constrained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Field is ignored under this basis; setting it earns a warning
    #[serde(default)]
    pub warning: bool,
}

impl FieldRule {
    /// Short field name used in messages
    #[inline]
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.path.field_name()
    }
}

/// Rules per adoption basis, for both scenario branches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMatrix {
    /// Where the PDS basis is read from (scenario catalog)
    pub pds_basis: PathTemplate,
    /// Where the reference basis is read from (reference catalog)
    pub reference_basis: PathTemplate,
    #[serde(default)]
    pub pds: BTreeMap<AdoptionBasis, Vec<FieldRule>>,
    #[serde(default)]
    pub reference: BTreeMap<ReferenceBasis, Vec<FieldRule>>,
}

impl RuleMatrix {
    /// Rules for a PDS basis; empty if none are declared
    #[must_use]
    pub fn pds_rules(&self, basis: AdoptionBasis) -> &[FieldRule] {
        self.pds.get(&basis).map_or(&[], Vec::as_slice)
    }

    /// Rules for a reference basis; empty if none are declared
    #[must_use]
    pub fn reference_rules(&self, basis: ReferenceBasis) -> &[FieldRule] {
        self.reference.get(&basis).map_or(&[], Vec::as_slice)
    }
}
