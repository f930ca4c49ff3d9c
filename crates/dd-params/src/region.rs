//! Model regions
//!
//! The fixed key set of per-region leaves. A JSON object carrying any of
//! these names as a key is a region map, not a branch.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One of the ten regions the model reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "World")]
    World,
    #[serde(rename = "OECD90")]
    Oecd90,
    #[serde(rename = "Eastern Europe")]
    EasternEurope,
    #[serde(rename = "Asia (Sans Japan)")]
    AsiaSansJapan,
    #[serde(rename = "Middle East and Africa")]
    MiddleEastAndAfrica,
    #[serde(rename = "Latin America")]
    LatinAmerica,
    #[serde(rename = "China")]
    China,
    #[serde(rename = "India")]
    India,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "USA")]
    Usa,
}

impl Region {
    /// All regions in report order
    pub const ALL: [Region; 10] = [
        Region::World,
        Region::Oecd90,
        Region::EasternEurope,
        Region::AsiaSansJapan,
        Region::MiddleEastAndAfrica,
        Region::LatinAmerica,
        Region::China,
        Region::India,
        Region::Eu,
        Region::Usa,
    ];

    /// Display name, as used for JSON keys
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Region::World => "World",
            Region::Oecd90 => "OECD90",
            Region::EasternEurope => "Eastern Europe",
            Region::AsiaSansJapan => "Asia (Sans Japan)",
            Region::MiddleEastAndAfrica => "Middle East and Africa",
            Region::LatinAmerica => "Latin America",
            Region::China => "China",
            Region::India => "India",
            Region::Eu => "EU",
            Region::Usa => "USA",
        }
    }

    /// Look up a region by its display name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == name)
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// Name that is not one of the model regions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region: '{0}'")]
pub struct UnknownRegion(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_names_roundtrip() {
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn region_unknown_name() {
        let err = "Atlantis".parse::<Region>().unwrap_err();
        assert_eq!(err.to_string(), "unknown region: 'Atlantis'");
    }

    #[test]
    fn region_serde_uses_display_name() {
        let json = serde_json::to_string(&Region::AsiaSansJapan).unwrap();
        assert_eq!(json, "\"Asia (Sans Japan)\"");
    }
}
