//! Feedback-driven learning: per-tag preference weights and the smoothed
//! success-rate statistics behind the bandit term.

pub mod bandit;
pub mod feedback;
pub mod preference;

pub use bandit::{BanditStats, TagStats};
pub use feedback::{FeedbackSignal, PreferenceStore};
pub use preference::{FEEDBACK_STEP, PREFERENCE_MAX, PREFERENCE_MIN, PreferenceModel};
