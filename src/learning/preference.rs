use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PREFERENCE_MIN: f64 = -20.0;
pub const PREFERENCE_MAX: f64 = 40.0;

/// Weight change applied per unit of feedback.
pub const FEEDBACK_STEP: f64 = 2.0;

/// Learned per-tag weights. Starts empty and only moves through feedback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceModel {
    weights: BTreeMap<String, f64>,
}

impl PreferenceModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight for a tag, zero when never touched.
    #[must_use]
    pub fn weight(&self, tag: &str) -> f64 {
        self.weights.get(tag).copied().unwrap_or(0.0)
    }

    /// Shift a tag's weight by `delta * FEEDBACK_STEP`, clamped to the
    /// allowed band. Returns the new weight.
    pub fn nudge(&mut self, tag: &str, delta: i8) -> f64 {
        let entry = self.weights.entry(tag.to_string()).or_insert(0.0);
        *entry = (*entry + f64::from(delta) * FEEDBACK_STEP).clamp(PREFERENCE_MIN, PREFERENCE_MAX);
        *entry
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(tag, weight)| (tag.as_str(), *weight))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Re-clamp after loading: a hand-edited store must not break the band.
    pub(crate) fn sanitize(&mut self) {
        for weight in self.weights.values_mut() {
            *weight = if weight.is_finite() {
                weight.clamp(PREFERENCE_MIN, PREFERENCE_MAX)
            } else {
                0.0
            };
        }
    }
}
