//! Explanation synthesis: heuristic line, evidence, narrative, composition.
//!
//! Each item is explained at most once per pipeline. The record for an item
//! lives in a `OnceCell`; concurrent callers for the same id await the same
//! initialization instead of starting a second one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::EvidenceLookup;
use crate::catalog::CatalogItem;
use crate::collaborators::{Evidence, NarrativeGenerator};
use crate::context::{ContextSnapshot, ProfileTags};
use crate::error::Result;

use super::heuristic::heuristic_line;
use super::narrative::{
    DEFAULT_ABSTRACT_MAX_CHARS, NarrativePrompt, fallback_narrative, short_title, usable_narrative,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

/// The finished, immutable explanation for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationRecord {
    pub item_id: String,
    pub heuristic_line: String,
    pub evidence: Option<Evidence>,
    pub narrative: String,
    pub narrative_source: NarrativeSource,
    pub composed_markup: String,
}

type Slot = Arc<OnceCell<Arc<ExplanationRecord>>>;

pub struct ExplanationPipeline {
    evidence: Arc<EvidenceLookup>,
    narrator: Arc<dyn NarrativeGenerator>,
    abstract_max_chars: usize,
    records: Mutex<HashMap<String, Slot>>,
}

impl ExplanationPipeline {
    #[must_use]
    pub fn new(evidence: Arc<EvidenceLookup>, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        Self {
            evidence,
            narrator,
            abstract_max_chars: DEFAULT_ABSTRACT_MAX_CHARS,
            records: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_abstract_limit(mut self, max_chars: usize) -> Self {
        self.abstract_max_chars = max_chars;
        self
    }

    /// Explain an item, building the record on first use.
    ///
    /// Only a failed evidence-cache write is an error; in that case nothing is
    /// stored and the next call starts over.
    pub async fn explain(
        &self,
        item: &CatalogItem,
        context: &ContextSnapshot,
        profile: &ProfileTags,
    ) -> Result<Arc<ExplanationRecord>> {
        let slot = self
            .records
            .lock()
            .entry(item.id.clone())
            .or_default()
            .clone();
        if let Some(record) = slot.get() {
            debug!(item = %item.id, "explanation served from memory");
            return Ok(record.clone());
        }
        let record = slot
            .get_or_try_init(|| self.build(item, context, profile))
            .await?;
        Ok(record.clone())
    }

    /// The stored record, if the item has been explained.
    #[must_use]
    pub fn cached(&self, item_id: &str) -> Option<Arc<ExplanationRecord>> {
        self.records
            .lock()
            .get(item_id)
            .and_then(|slot| slot.get().cloned())
    }

    async fn build(
        &self,
        item: &CatalogItem,
        context: &ContextSnapshot,
        profile: &ProfileTags,
    ) -> Result<Arc<ExplanationRecord>> {
        let heuristic = heuristic_line(item, context, profile);

        let evidence = match item.first_tag() {
            Some(tag) => self.evidence.lookup(tag).await?,
            None => None,
        };

        let prompt = NarrativePrompt::build(
            item,
            context,
            profile,
            evidence.as_ref(),
            self.abstract_max_chars,
        );
        let generated = match self.narrator.generate(&prompt).await {
            Ok(raw) => usable_narrative(raw),
            Err(err) => {
                warn!(item = %item.id, error = %err, "narrative generation failed");
                None
            }
        };
        let (narrative, narrative_source) = match generated {
            Some(text) => (text, NarrativeSource::Generated),
            None => {
                debug!(item = %item.id, "using fallback narrative");
                (
                    fallback_narrative(&item.title, prompt.evidence_abstract.as_deref()),
                    NarrativeSource::Fallback,
                )
            }
        };

        let composed_markup = compose(&heuristic, evidence.as_ref(), &narrative);
        info!(
            item = %item.id,
            evidence = evidence.is_some(),
            source = ?narrative_source,
            "explanation built"
        );
        Ok(Arc::new(ExplanationRecord {
            item_id: item.id.clone(),
            heuristic_line: heuristic,
            evidence,
            narrative,
            narrative_source,
            composed_markup,
        }))
    }
}

/// Markdown block: rationale, optional evidence link, then the narrative.
#[must_use]
pub fn compose(heuristic: &str, evidence: Option<&Evidence>, narrative: &str) -> String {
    let mut out = format!("**Why this dish:** {heuristic}\n\n");
    if let Some(evidence) = evidence {
        out.push_str(&format!(
            "**Evidence:** [{}]({})\n\n",
            short_title(&evidence.title),
            evidence.url
        ));
    }
    out.push_str(narrative);
    out
}
