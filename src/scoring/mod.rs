//! Item scoring.
//!
//! A score is the sum of independent terms; only the relative order of
//! scores matters. Every term except novelty is a pure function of the item,
//! the context snapshot, the profile and the learned stores.

use serde::Serialize;
use tracing::trace;

use crate::catalog::CatalogItem;
use crate::context::{ActivityLevel, ContextSnapshot, FLAG_HIGH_BP, FLAG_LOW_ACTIVITY, ProfileTags};
use crate::learning::{BanditStats, PreferenceModel};

pub mod external;
pub mod novelty;

pub use external::score_catalog;
pub use novelty::{DEFAULT_NOVELTY_MAX, FixedNovelty, NoveltySource, UniformNovelty, novelty_source};

pub const PROFILE_TAG_BONUS: f64 = 12.0;
pub const HIGH_SODIUM_PENALTY: f64 = 8.0;
pub const LOW_ACTIVITY_PENALTY: f64 = 4.0;
pub const CALORIE_BURN_THRESHOLD: f64 = 400.0;
pub const POST_WORKOUT_PROTEIN_BONUS: f64 = 8.0;
pub const ELEVATED_BP_LOW_SODIUM_BONUS: f64 = 10.0;
pub const LOW_ACTIVITY_LIGHT_BONUS: f64 = 6.0;
pub const BANDIT_WEIGHT: f64 = 4.0;
pub const SUITABILITY_WEIGHT: f64 = 2.0;

pub const TAG_LOW_SODIUM: &str = "low-sodium";
pub const TAG_HIGH_SODIUM: &str = "high-sodium";
pub const TAG_HIGH_PROTEIN_SNACK: &str = "high-protein-snack";
pub const TAG_LIGHT_CLEAN: &str = "light-clean";
pub const TAG_LIGHT: &str = "light";
pub const TAG_LOW_CALORIE: &str = "low-calorie";

/// Borrowed view of everything a score depends on besides the item.
#[derive(Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub context: &'a ContextSnapshot,
    pub profile: &'a ProfileTags,
    pub preferences: &'a PreferenceModel,
    pub bandit: &'a BanditStats,
}

/// Per-term contributions, in the order they are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub preference: f64,
    pub profile: f64,
    pub medical: f64,
    pub vitals: f64,
    pub novelty: f64,
    pub bandit: f64,
    pub suitability: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.preference
            + self.profile
            + self.medical
            + self.vitals
            + self.novelty
            + self.bandit
            + self.suitability
    }
}

/// An item counts as light when it carries any of the light tags.
#[must_use]
pub fn is_light(item: &CatalogItem) -> bool {
    item.has_tag(TAG_LIGHT) || item.has_tag(TAG_LIGHT_CLEAN) || item.has_tag(TAG_LOW_CALORIE)
}

/// Compute every term for one item. Draws exactly one novelty sample.
pub fn score_breakdown(
    item: &CatalogItem,
    inputs: &ScoringInputs<'_>,
    novelty: &mut dyn NoveltySource,
) -> ScoreBreakdown {
    let ctx = inputs.context;
    let tags = &item.tags;

    let preference = tags.iter().map(|t| inputs.preferences.weight(t)).sum();

    let profile = tags
        .iter()
        .filter(|t| inputs.profile.wants(t))
        .count() as f64
        * PROFILE_TAG_BONUS;

    let mut medical = 0.0;
    if inputs.profile.has_flag(FLAG_HIGH_BP)
        && item.has_tag(TAG_HIGH_SODIUM)
        && !item.has_tag(TAG_LOW_SODIUM)
    {
        medical -= HIGH_SODIUM_PENALTY;
    }
    // Untagged items are never penalized.
    if inputs.profile.has_flag(FLAG_LOW_ACTIVITY) && !tags.is_empty() && !is_light(item) {
        medical -= LOW_ACTIVITY_PENALTY;
    }

    let mut vitals = 0.0;
    if ctx.calories_burned.unwrap_or(0.0) > CALORIE_BURN_THRESHOLD
        && item.has_tag(TAG_HIGH_PROTEIN_SNACK)
    {
        vitals += POST_WORKOUT_PROTEIN_BONUS;
    }
    if ctx.bp_elevated() && item.has_tag(TAG_LOW_SODIUM) {
        vitals += ELEVATED_BP_LOW_SODIUM_BONUS;
    }
    if ctx.activity_level == Some(ActivityLevel::Low) && item.has_tag(TAG_LIGHT_CLEAN) {
        vitals += LOW_ACTIVITY_LIGHT_BONUS;
    }

    let novelty = novelty.sample();

    let bandit = tags
        .iter()
        .map(|t| BANDIT_WEIGHT * inputs.bandit.rate(t))
        .sum();

    let suitability = item
        .suitability
        .filter(|s| s.is_finite())
        .map_or(0.0, |s| SUITABILITY_WEIGHT * s);

    let breakdown = ScoreBreakdown {
        preference,
        profile,
        medical,
        vitals,
        novelty,
        bandit,
        suitability,
    };
    trace!(item = %item.id, ?breakdown, "scored");
    breakdown
}

/// Total score for one item.
pub fn score(
    item: &CatalogItem,
    inputs: &ScoringInputs<'_>,
    novelty: &mut dyn NoveltySource,
) -> f64 {
    score_breakdown(item, inputs, novelty).total()
}
