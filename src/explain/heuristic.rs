//! Rule-based "why this dish" line. Synchronous and infallible.

use crate::catalog::CatalogItem;
use crate::context::{ActivityLevel, ContextSnapshot, FLAG_HIGH_BP, FLAG_LOW_ACTIVITY, ProfileTags};
use crate::scoring::{
    CALORIE_BURN_THRESHOLD, TAG_HIGH_PROTEIN_SNACK, TAG_LIGHT_CLEAN, TAG_LOW_SODIUM, is_light,
};

pub const MAX_REASONS: usize = 3;
pub const GENERIC_REASON: &str = "Matches your preferences";

const TAG_DESCRIPTIONS: &[(&str, &str)] = &[
    ("low-sodium", "Low in sodium"),
    ("high-protein-snack", "A good source of protein"),
    ("low-carb", "Light on carbohydrates"),
    ("light-clean", "Light and minimally processed"),
    ("satvik", "Simple satvik preparation"),
    ("low-calorie", "Low in calories"),
    ("veg", "Vegetarian"),
];

/// Up to three reasons (medical rules, then profile matches, then vitals
/// rules), followed by the context categories that informed them.
#[must_use]
pub fn heuristic_line(item: &CatalogItem, ctx: &ContextSnapshot, profile: &ProfileTags) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if profile.has_flag(FLAG_HIGH_BP) && item.has_tag(TAG_LOW_SODIUM) {
        reasons.push("Low sodium supports your blood pressure goals".into());
    }
    if profile.has_flag(FLAG_LOW_ACTIVITY) && is_light(item) {
        reasons.push("A lighter option for a less active day".into());
    }
    for tag in item.tags.iter().filter(|tag| profile.wants(tag)) {
        reasons.push(format!("Fits your {} needs", tag.replace('-', " ")));
    }
    if ctx.calories_burned.unwrap_or(0.0) > CALORIE_BURN_THRESHOLD
        && item.has_tag(TAG_HIGH_PROTEIN_SNACK)
    {
        reasons.push("Protein to help you recover from today's activity".into());
    }
    if ctx.bp_elevated() && item.has_tag(TAG_LOW_SODIUM) {
        reasons.push("Keeps sodium down while your blood pressure is up".into());
    }
    if ctx.activity_level == Some(ActivityLevel::Low) && item.has_tag(TAG_LIGHT_CLEAN) {
        reasons.push("Light and clean while activity is low".into());
    }

    if reasons.is_empty() {
        reasons = item
            .tags
            .iter()
            .filter_map(|tag| {
                TAG_DESCRIPTIONS
                    .iter()
                    .find(|(known, _)| *known == tag.as_str())
                    .map(|(_, text)| (*text).to_string())
            })
            .collect();
    }
    if reasons.is_empty() {
        reasons.push(GENERIC_REASON.into());
    }
    reasons.dedup();
    reasons.truncate(MAX_REASONS);

    format!("{}. {}", reasons.join("; "), context_clause(ctx))
}

/// Names which readings were available, never their values.
fn context_clause(ctx: &ContextSnapshot) -> String {
    let mut used = Vec::new();
    if ctx.calories_burned.is_some() {
        used.push("calorie burn");
    }
    if ctx.has_blood_pressure() {
        used.push("blood pressure");
    }
    if ctx.activity_level.is_some() {
        used.push("activity");
    }
    match used.as_slice() {
        [] => "Based on your saved preferences.".to_string(),
        [only] => format!("Based on your {only}."),
        [head @ .., last] => format!("Based on your {} and {last}.", head.join(", ")),
    }
}
