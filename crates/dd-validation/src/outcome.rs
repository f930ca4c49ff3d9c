//! Validation result

use serde::{Deserialize, Serialize};

/// Verdict on a candidate variation
///
/// `reason` is present only when `valid` is false. Warnings may accompany
/// an accepted variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    /// Accepted with no warnings
    #[inline]
    #[must_use]
    pub fn accepted() -> Self {
        Self::accepted_with(Vec::new())
    }

    /// Accepted with warnings
    #[inline]
    #[must_use]
    pub fn accepted_with(warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            reason: None,
            warnings,
        }
    }

    /// Rejected for `reason`
    #[inline]
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Prepend warnings gathered by an earlier stage
    #[must_use]
    pub fn with_prior_warnings(mut self, mut prior: Vec<String>) -> Self {
        prior.append(&mut self.warnings);
        self.warnings = prior;
        self
    }

    /// Transport status: 200 when accepted, 422 when rejected
    #[inline]
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.valid {
            200
        } else {
            422
        }
    }
}
