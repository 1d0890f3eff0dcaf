//! Cached fronts for the nutrition and evidence collaborators.
//!
//! Both lookups follow the same ladder: cache, then the collaborator, then a
//! small built-in table. Running off the end of the ladder is "not found",
//! never an error. Only a failed cache write is reported to the caller.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::catalog::Macros;
use crate::catalog::normalize::template_macros;
use crate::collaborators::{Evidence, EvidenceSource, NutritionSource};
use crate::error::Result;
use crate::storage::{EVIDENCE_CACHE_KEY, KeyValueStore, MACROS_CACHE_KEY};

use super::ttl::{CacheStats, TtlCache};

pub const DEFAULT_MACRO_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const PUBMED_SEARCH: &str = "https://pubmed.ncbi.nlm.nih.gov/?term=";

/// Alternative phrasings per tag; one is picked at random on each miss so
/// repeated lookups do not always land on the same paper.
const EVIDENCE_QUERIES: &[(&str, &[&str])] = &[
    (
        "low-sodium",
        &[
            "dietary sodium reduction blood pressure",
            "DASH diet sodium hypertension",
            "low salt diet cardiovascular outcomes",
        ],
    ),
    (
        "high-protein-snack",
        &[
            "post-exercise protein intake muscle recovery",
            "protein timing resistance training",
        ],
    ),
    (
        "low-carb",
        &[
            "low carbohydrate diet glycemic control",
            "carbohydrate restriction insulin sensitivity",
        ],
    ),
    (
        "light-clean",
        &[
            "whole food diet inflammation markers",
            "vegetable intake low energy density satiety",
        ],
    ),
    (
        "satvik",
        &[
            "lacto-vegetarian diet metabolic health",
            "plant-based diet stress and sleep quality",
        ],
    ),
];

/// Static evidence used when the collaborator has nothing.
const STATIC_EVIDENCE: &[(&str, &str, &str)] = &[
    (
        "low-sodium",
        "Effects of reduced sodium intake on blood pressure",
        "Reducing dietary sodium lowers blood pressure in adults with and without hypertension. The effect is larger at higher baseline pressure.",
    ),
    (
        "high-protein-snack",
        "Protein intake and recovery after exercise",
        "Protein consumed after exercise supports muscle protein synthesis. Spreading intake across the day helps recovery.",
    ),
    (
        "low-carb",
        "Carbohydrate restriction and glycemic control",
        "Lower carbohydrate meals reduce post-meal glucose excursions. Benefits are most visible in people with impaired glucose tolerance.",
    ),
    (
        "light-clean",
        "Energy density, vegetables and satiety",
        "Meals built on vegetables and minimally processed foods are filling at lower calorie loads. They are associated with lower inflammatory markers.",
    ),
    (
        "satvik",
        "Vegetarian dietary patterns and metabolic health",
        "Vegetarian dietary patterns are associated with improved lipid profiles and body weight. Simple home-style preparations keep sodium and fat modest.",
    ),
];

/// Macros for a dish title. Entries expire after the configured TTL.
pub struct MacroLookup {
    cache: Mutex<TtlCache<Macros>>,
    source: Arc<dyn NutritionSource>,
}

impl MacroLookup {
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn NutritionSource>,
        ttl: Duration,
    ) -> Result<Self> {
        Ok(Self {
            cache: Mutex::new(TtlCache::load(store, MACROS_CACHE_KEY, Some(ttl))?),
            source,
        })
    }

    /// Template macros are returned uncached so a later collaborator answer
    /// can still replace them.
    pub async fn lookup(&self, title: &str) -> Result<Option<Macros>> {
        let cached = self.cache.lock().get(title);
        if let Some(macros) = cached {
            debug!(title, "macro cache hit");
            return Ok(Some(macros));
        }
        match self.source.macros(title).await {
            Ok(Some(macros)) => {
                self.cache.lock().insert(title, macros)?;
                return Ok(Some(macros));
            }
            Ok(None) => debug!(title, "nutrition source had no entry"),
            Err(err) => warn!(title, error = %err, "nutrition lookup failed, using templates"),
        }
        Ok(template_macros(title))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }
}

/// Research evidence per tag. Entries never expire.
pub struct EvidenceLookup {
    cache: Mutex<TtlCache<Evidence>>,
    source: Arc<dyn EvidenceSource>,
    rng: Mutex<StdRng>,
}

impl EvidenceLookup {
    pub fn load(store: Arc<dyn KeyValueStore>, source: Arc<dyn EvidenceSource>) -> Result<Self> {
        Ok(Self {
            cache: Mutex::new(TtlCache::load(store, EVIDENCE_CACHE_KEY, None)?),
            source,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Pin the query choice.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub async fn lookup(&self, tag: &str) -> Result<Option<Evidence>> {
        let cached = self.cache.lock().get(tag);
        if let Some(evidence) = cached {
            debug!(tag, "evidence cache hit");
            return Ok(Some(evidence));
        }
        let query = self.pick_query(tag);
        match self.source.evidence(&query).await {
            Ok(Some(evidence)) => {
                self.cache.lock().insert(tag, evidence.clone())?;
                return Ok(Some(evidence));
            }
            Ok(None) => debug!(tag, query, "evidence source had no entry"),
            Err(err) => warn!(tag, query, error = %err, "evidence lookup failed, using static table"),
        }
        Ok(static_evidence(tag))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    fn pick_query(&self, tag: &str) -> String {
        let candidates = EVIDENCE_QUERIES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(tag))
            .map(|(_, queries)| *queries);
        match candidates.and_then(|queries| queries.choose(&mut *self.rng.lock())) {
            Some(query) => (*query).to_string(),
            None => format!("{} diet health", tag.replace('-', " ")),
        }
    }
}

/// Built-in evidence for a known tag.
#[must_use]
pub fn static_evidence(tag: &str) -> Option<Evidence> {
    STATIC_EVIDENCE
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(tag))
        .map(|(known, title, summary)| Evidence {
            title: (*title).to_string(),
            url: format!("{PUBMED_SEARCH}{}", urlencoding::encode(&known.replace('-', " "))),
            summary: (*summary).to_string(),
        })
}
