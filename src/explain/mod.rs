//! On-demand explanations for recommended items.

pub mod heuristic;
pub mod narrative;
pub mod pipeline;

pub use heuristic::heuristic_line;
pub use narrative::{
    DEFAULT_ABSTRACT_MAX_CHARS, NarrativePrompt, fallback_narrative, short_title, usable_narrative,
};
pub use pipeline::{ExplanationPipeline, ExplanationRecord, NarrativeSource, compose};
