//! Two-component truth values.
//!
//! Only the slice of the truth algebra the control layer touches: the
//! expectation used to budget premises, the quality conversion used for
//! operation feedback, and bit-exact equality for belief deduplication.
//! Revision, projection, and the rule-level functions live with the deriver.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Frequency/confidence truth value, both components in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TruthValue {
    /// Observed frequency of the statement holding.
    pub frequency: f32,
    /// Confidence in the frequency estimate.
    pub confidence: f32,
}

impl TruthValue {
    /// Create a truth value, clamping both components to [0, 1].
    #[must_use]
    pub fn new(frequency: f32, confidence: f32) -> Self {
        Self {
            frequency: frequency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Expectation: `c * (f - 0.5) + 0.5`, the decision-theoretic weight of
    /// the statement.
    #[must_use]
    pub fn expectation(&self) -> f32 {
        self.confidence * (self.frequency - 0.5) + 0.5
    }
}

/// Convert a truth value to a budget quality.
#[must_use]
pub fn truth_to_quality(truth: &TruthValue) -> f32 {
    let e = truth.expectation();
    e.max((1.0 - e) * 0.75)
}

impl PartialEq for TruthValue {
    fn eq(&self, other: &Self) -> bool {
        self.frequency.to_bits() == other.frequency.to_bits()
            && self.confidence.to_bits() == other.confidence.to_bits()
    }
}

impl Eq for TruthValue {}

impl Hash for TruthValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.frequency.to_bits().hash(state);
        self.confidence.to_bits().hash(state);
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:.2};{:.2}%", self.frequency, self.confidence)
    }
}
