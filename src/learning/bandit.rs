use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Exposure and success counts for one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    #[serde(default)]
    pub shown: u64,
    #[serde(default)]
    pub success: u64,
}

impl TagStats {
    /// Laplace-smoothed success rate, `(success + 1) / (shown + 2)`.
    ///
    /// This is the posterior mean under a Beta(1, 1) prior. `success` may
    /// exceed `shown` when a tag is liked without ever being rendered; the
    /// rate then exceeds one half but stays finite.
    #[must_use]
    pub fn smoothed_rate(&self) -> f64 {
        (self.success as f64 + 1.0) / (self.shown as f64 + 2.0)
    }
}

/// Per-tag exposure/success counters. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BanditStats {
    tags: BTreeMap<String, TagStats>,
}

impl BanditStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> TagStats {
        self.tags.get(tag).copied().unwrap_or_default()
    }

    /// Smoothed rate for a tag; an unseen tag sits at the prior mean of 0.5.
    #[must_use]
    pub fn rate(&self, tag: &str) -> f64 {
        self.get(tag).smoothed_rate()
    }

    pub fn record_shown(&mut self, tag: &str) {
        self.tags.entry(tag.to_string()).or_default().shown += 1;
    }

    pub fn record_success(&mut self, tag: &str) {
        self.tags.entry(tag.to_string()).or_default().success += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TagStats)> {
        self.tags.iter().map(|(tag, stats)| (tag.as_str(), *stats))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
