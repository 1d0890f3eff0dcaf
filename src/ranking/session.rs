//! One recommendation session: the catalog, the live context, the learned
//! stores and the current page.
//!
//! Every mutation follows the same order: mutate, persist, then re-rank.
//! Rankings are never patched in place.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::MacroLookup;
use crate::catalog::CatalogItem;
use crate::collaborators::SuitabilityScorer;
use crate::context::{ContextSnapshot, ProfileTags};
use crate::error::{NpError, Result};
use crate::learning::{FeedbackSignal, PreferenceStore};
use crate::scoring::{NoveltySource, ScoringInputs, score_catalog};

use super::pager::Pager;
use super::{FilterPrefs, RankedResult, rank};

/// What triggered a ranking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Explicit,
    Context,
    Feedback,
    Scheduled,
    /// Silent context poll; keeps the reader on the page they were looking at.
    BackgroundPoll,
}

impl RefreshReason {
    #[must_use]
    pub const fn resets_page(self) -> bool {
        !matches!(self, Self::BackgroundPoll)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    position: usize,
    score: f64,
}

/// One row of a rendered page. `rank` is 1-based across the whole ranking.
#[derive(Debug, Clone, Serialize)]
pub struct PageEntry<'a> {
    pub rank: usize,
    pub score: f64,
    #[serde(flatten)]
    pub item: &'a CatalogItem,
}

pub struct Recommender {
    catalog: Vec<CatalogItem>,
    context: ContextSnapshot,
    profile: ProfileTags,
    filter: FilterPrefs,
    preferences: PreferenceStore,
    novelty: Box<dyn NoveltySource>,
    macros: Arc<MacroLookup>,
    ranked: Vec<Slot>,
    pager: Pager,
}

impl Recommender {
    /// Build a session and run the first ranking pass.
    pub fn new(
        catalog: Vec<CatalogItem>,
        preferences: PreferenceStore,
        macros: Arc<MacroLookup>,
        novelty: Box<dyn NoveltySource>,
        page_size: usize,
    ) -> Self {
        let mut session = Self {
            catalog,
            context: ContextSnapshot::default(),
            profile: ProfileTags::default(),
            filter: FilterPrefs::default(),
            preferences,
            novelty,
            macros,
            ranked: Vec::new(),
            pager: Pager::new(page_size),
        };
        session.refresh(RefreshReason::Explicit);
        session
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterPrefs) -> Self {
        self.filter = filter;
        self.refresh(RefreshReason::Explicit);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: ContextSnapshot, profile: ProfileTags) -> Self {
        self.context = context;
        self.profile = profile;
        self.refresh(RefreshReason::Explicit);
        self
    }

    /// Full ranking pass over the filtered catalog.
    pub fn refresh(&mut self, reason: RefreshReason) {
        let inputs = ScoringInputs {
            context: &self.context,
            profile: &self.profile,
            preferences: self.preferences.model(),
            bandit: self.preferences.bandit(),
        };
        let ranked = rank(&self.catalog, &self.filter, &inputs, self.novelty.as_mut());
        self.ranked = ranked
            .iter()
            .map(|r| Slot {
                position: r.position,
                score: r.score,
            })
            .collect();
        self.pager.resize(self.ranked.len(), reason.resets_page());
        info!(
            ?reason,
            ranked = self.ranked.len(),
            page = self.pager.page(),
            "recommendations refreshed"
        );
    }

    /// Replace the context and profile wholesale, then re-rank. A silent
    /// refresh keeps the current page.
    pub fn refresh_context(&mut self, context: ContextSnapshot, profile: ProfileTags, silent: bool) {
        self.context = context;
        self.profile = profile;
        let reason = if silent {
            RefreshReason::BackgroundPoll
        } else {
            RefreshReason::Context
        };
        self.refresh(reason);
    }

    pub fn set_filter(&mut self, filter: FilterPrefs) {
        self.filter = filter;
        self.refresh(RefreshReason::Explicit);
    }

    /// Apply like/skip to every tag of an item, persist, then re-rank.
    pub fn feedback(&mut self, item_id: &str, signal: FeedbackSignal) -> Result<()> {
        let tags = self
            .item(item_id)
            .map(|item| item.tags.clone())
            .ok_or_else(|| NpError::ItemNotFound(item_id.to_string()))?;
        self.preferences.apply_feedback(&tags, signal)?;
        self.refresh(RefreshReason::Feedback);
        Ok(())
    }

    /// Drop all learned state and re-rank.
    pub fn reset_learning(&mut self) -> Result<()> {
        self.preferences.reset()?;
        self.refresh(RefreshReason::Explicit);
        Ok(())
    }

    /// Ask the external scorer about every unscored item, then re-rank.
    pub async fn score_external(&mut self, scorer: &dyn SuitabilityScorer, concurrency: usize) -> usize {
        let scored = score_catalog(&mut self.catalog, &self.context, scorer, concurrency).await;
        if scored > 0 {
            self.refresh(RefreshReason::Explicit);
        }
        scored
    }

    /// Materialize the current page: fetch missing macros concurrently, then
    /// count one exposure per tag per item and persist the counters.
    pub async fn render_page(&mut self) -> Result<Vec<PageEntry<'_>>> {
        let range = self.pager.range();
        let positions: Vec<usize> = self.ranked[range.clone()]
            .iter()
            .map(|slot| slot.position)
            .collect();

        let missing: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| self.catalog[p].macros.is_none())
            .collect();
        let fetched = join_all(
            missing
                .iter()
                .map(|&p| self.macros.lookup(&self.catalog[p].title)),
        )
        .await;
        for (p, macros) in missing.iter().copied().zip(fetched) {
            if let Some(macros) = macros? {
                self.catalog[p].macros = Some(macros);
            }
        }
        debug!(page = self.pager.page(), prefetched = missing.len(), "macros prefetched");

        self.preferences.record_shown(
            positions
                .iter()
                .flat_map(|&p| self.catalog[p].tags.iter().map(String::as_str)),
        )?;

        Ok(positions
            .iter()
            .zip(range)
            .map(|(&p, idx)| PageEntry {
                rank: idx + 1,
                score: self.ranked[idx].score,
                item: &self.catalog[p],
            })
            .collect())
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    pub fn set_page(&mut self, page: usize) {
        self.pager.go_to(page);
    }

    /// The full ordering, best first.
    #[must_use]
    pub fn ranked(&self) -> Vec<RankedResult<'_>> {
        self.ranked
            .iter()
            .map(|slot| RankedResult {
                item: &self.catalog[slot.position],
                score: slot.score,
                position: slot.position,
            })
            .collect()
    }

    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&CatalogItem> {
        self.catalog.iter().find(|item| item.id == item_id)
    }

    #[must_use]
    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    #[must_use]
    pub const fn context(&self) -> &ContextSnapshot {
        &self.context
    }

    #[must_use]
    pub const fn profile(&self) -> &ProfileTags {
        &self.profile
    }

    #[must_use]
    pub const fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    #[must_use]
    pub const fn pager(&self) -> &Pager {
        &self.pager
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterPrefs {
        &self.filter
    }
}
