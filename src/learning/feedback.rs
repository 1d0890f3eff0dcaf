//! Like/skip feedback and the persisted store it mutates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::storage::{KeyValueStore, PREFERENCE_MODEL_KEY, TAG_STATS_KEY, load_json, save_json};

use super::bandit::BanditStats;
use super::preference::PreferenceModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSignal {
    Like,
    Skip,
}

impl FeedbackSignal {
    #[must_use]
    pub const fn delta(self) -> i8 {
        match self {
            Self::Like => 1,
            Self::Skip => -1,
        }
    }

    #[must_use]
    pub const fn from_delta(delta: i8) -> Option<Self> {
        match delta {
            1 => Some(Self::Like),
            -1 => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Preference weights plus bandit counters, written through to the backing
/// store after every mutation.
pub struct PreferenceStore {
    model: PreferenceModel,
    bandit: BanditStats,
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut model: PreferenceModel =
            load_json(store.as_ref(), PREFERENCE_MODEL_KEY)?.unwrap_or_default();
        model.sanitize();
        let bandit: BanditStats = load_json(store.as_ref(), TAG_STATS_KEY)?.unwrap_or_default();
        debug!(
            weights = model.len(),
            "loaded preference store"
        );
        Ok(Self {
            model,
            bandit,
            store,
        })
    }

    #[must_use]
    pub const fn model(&self) -> &PreferenceModel {
        &self.model
    }

    #[must_use]
    pub const fn bandit(&self) -> &BanditStats {
        &self.bandit
    }

    /// Apply one feedback event to every tag of an item and persist both
    /// records. A write failure is returned, not swallowed.
    pub fn apply_feedback<S: AsRef<str>>(&mut self, tags: &[S], signal: FeedbackSignal) -> Result<()> {
        let delta = signal.delta();
        for tag in tags {
            let tag = tag.as_ref();
            let weight = self.model.nudge(tag, delta);
            if delta > 0 {
                self.bandit.record_success(tag);
            }
            debug!(tag, weight, ?signal, "preference updated");
        }
        self.persist()?;
        info!(tags = tags.len(), ?signal, "feedback recorded");
        Ok(())
    }

    /// Count one exposure per tag, then persist the bandit record.
    pub fn record_shown<'a, I>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for tag in tags {
            self.bandit.record_shown(tag);
        }
        save_json(self.store.as_ref(), TAG_STATS_KEY, &self.bandit)
    }

    /// Drop all learned state.
    pub fn reset(&mut self) -> Result<()> {
        self.model = PreferenceModel::new();
        self.bandit = BanditStats::new();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), PREFERENCE_MODEL_KEY, &self.model)?;
        save_json(self.store.as_ref(), TAG_STATS_KEY, &self.bandit)
    }
}
