//! Narrative prompt construction and the deterministic fallback narrative.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogItem, Macros};
use crate::collaborators::Evidence;
use crate::context::{ContextSnapshot, ProfileTags};

pub const DEFAULT_ABSTRACT_MAX_CHARS: usize = 1200;
pub const SHORT_TITLE_WORDS: usize = 8;

const NO_ANSWER: &str = "no answer";

pub const DIETARY_CHECKLIST: [&str; 4] = [
    "Stress: anti-inflammatory foods such as leafy greens, turmeric and nuts",
    "Low activity: nutrient-dense rather than calorie-heavy meals",
    "Sleep issues: magnesium-rich foods such as seeds, legumes and whole grains",
    "Bone healing: protein, calcium and vitamin D sources such as dairy, eggs and pulses",
];

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid regex"));

/// Structured request sent to the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePrompt {
    pub question: String,
    pub context: ContextSnapshot,
    pub profile_tags: Vec<String>,
    pub medical_flags: Vec<String>,
    pub item_title: String,
    pub item_tags: Vec<String>,
    pub macros: Option<Macros>,
    pub evidence_abstract: Option<String>,
}

impl NarrativePrompt {
    #[must_use]
    pub fn build(
        item: &CatalogItem,
        context: &ContextSnapshot,
        profile: &ProfileTags,
        evidence: Option<&Evidence>,
        abstract_max_chars: usize,
    ) -> Self {
        Self {
            question: format!(
                "In three or four sentences, explain why {} suits this person today.",
                item.title
            ),
            context: context.clone(),
            profile_tags: profile.tags.clone(),
            medical_flags: profile.medical_flags.iter().cloned().collect(),
            item_title: item.title.clone(),
            item_tags: item.tags.clone(),
            macros: item.macros,
            evidence_abstract: evidence
                .map(|e| truncate_chars(&e.summary, abstract_max_chars))
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Truncate on a character boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Empty, blank and "no answer" responses count as no narrative at all.
#[must_use]
pub fn usable_narrative(raw: Option<String>) -> Option<String> {
    let text = raw?.trim().to_string();
    if text.is_empty() {
        return None;
    }
    let sentinel = text.trim_end_matches('.').trim().to_lowercase();
    if sentinel == NO_ANSWER {
        return None;
    }
    Some(text)
}

/// First `limit` sentences of a passage. Text without sentence punctuation is
/// returned whole.
#[must_use]
pub fn leading_sentences(text: &str, limit: usize) -> String {
    let sentences: Vec<&str> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .take(limit)
        .collect();
    if sentences.is_empty() {
        text.trim().to_string()
    } else {
        sentences.join(" ")
    }
}

/// Narrative built without the generator: evidence lead, the dietary
/// checklist, and a closing line that ends with the item title.
#[must_use]
pub fn fallback_narrative(title: &str, evidence_abstract: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(lead) = evidence_abstract
        .map(|text| leading_sentences(text, 2))
        .filter(|lead| !lead.is_empty())
    {
        out.push_str(&lead);
        out.push_str("\n\n");
    }
    out.push_str("What your body is asking for right now:\n");
    for point in DIETARY_CHECKLIST {
        out.push_str("- ");
        out.push_str(point);
        out.push('\n');
    }
    out.push_str("\nA dish that covers these needs today: ");
    out.push_str(title);
    out
}

/// Title cut to eight words, with an ellipsis when anything was dropped.
#[must_use]
pub fn short_title(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() <= SHORT_TITLE_WORDS {
        words.join(" ")
    } else {
        format!("{}…", words[..SHORT_TITLE_WORDS].join(" "))
    }
}
