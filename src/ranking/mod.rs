//! Filtering, ordering and paging of the catalog.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogItem, DietType};
use crate::scoring::{NoveltySource, ScoringInputs, score};

pub mod pager;
pub mod session;

pub use pager::Pager;
pub use session::{PageEntry, Recommender, RefreshReason};

pub const TAG_SATVIK: &str = "satvik";

/// Explicit diet preference. Absent means "anything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietPreference {
    Veg,
    #[serde(alias = "non-veg")]
    NonVeg,
}

impl DietPreference {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "veg" | "vegetarian" => Some(Self::Veg),
            "nonveg" | "non-veg" | "non_veg" => Some(Self::NonVeg),
            _ => None,
        }
    }

    const fn admits(self, diet: DietType) -> bool {
        matches!(
            (self, diet),
            (Self::Veg, DietType::Veg) | (Self::NonVeg, DietType::NonVeg)
        )
    }
}

/// Hard constraints applied before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPrefs {
    #[serde(default)]
    pub diet: Option<DietPreference>,
    #[serde(default)]
    pub satvik_only: bool,
}

impl FilterPrefs {
    /// Items missing the attribute a constraint looks at are kept.
    #[must_use]
    pub fn admits(&self, item: &CatalogItem) -> bool {
        if let (Some(pref), Some(diet)) = (self.diet, item.diet) {
            if !pref.admits(diet) {
                return false;
            }
        }
        if self.satvik_only && !item.tags.is_empty() && !item.has_tag(TAG_SATVIK) {
            return false;
        }
        true
    }
}

/// One scored item. `position` is the item's index in the catalog slice
/// that was ranked.
#[derive(Debug, Clone, Copy)]
pub struct RankedResult<'a> {
    pub item: &'a CatalogItem,
    pub score: f64,
    pub position: usize,
}

/// Filter, score and sort the whole catalog, best first.
///
/// Ties keep catalog order (the sort is stable), so with the novelty term
/// pinned the result is fully deterministic.
pub fn rank<'a>(
    catalog: &'a [CatalogItem],
    filter: &FilterPrefs,
    inputs: &ScoringInputs<'_>,
    novelty: &mut dyn NoveltySource,
) -> Vec<RankedResult<'a>> {
    let mut ranked: Vec<RankedResult<'a>> = catalog
        .iter()
        .enumerate()
        .filter(|(_, item)| filter.admits(item))
        .map(|(position, item)| RankedResult {
            item,
            score: score(item, inputs, novelty),
            position,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    debug!(
        catalog = catalog.len(),
        ranked = ranked.len(),
        "ranking pass complete"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextSnapshot, ProfileTags};
    use crate::learning::{BanditStats, PreferenceModel};
    use crate::scoring::FixedNovelty;
    use crate::test_utils::{TestCase, run_table_tests};

    fn sample_catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("Chicken Tikka", &["high-protein-snack"]).with_diet(DietType::NonVeg),
            CatalogItem::new("Paneer Salad", &["light-clean"]).with_diet(DietType::Veg),
            CatalogItem::new("Mystery Box", &[]),
            CatalogItem::new("Khichdi", &["satvik"]).with_diet(DietType::Veg),
        ]
    }

    #[test]
    fn veg_preference_drops_nonveg_keeps_untyped() {
        let catalog = sample_catalog();
        let filter = FilterPrefs {
            diet: Some(DietPreference::Veg),
            satvik_only: false,
        };
        let kept: Vec<_> = catalog.iter().filter(|i| filter.admits(i)).map(|i| i.title.as_str()).collect();
        assert_eq!(kept, vec!["Paneer Salad", "Mystery Box", "Khichdi"]);
    }

    #[test]
    fn satvik_only_requires_tag_when_tags_present() {
        let catalog = sample_catalog();
        let filter = FilterPrefs {
            diet: None,
            satvik_only: true,
        };
        let kept: Vec<_> = catalog.iter().filter(|i| filter.admits(i)).map(|i| i.title.as_str()).collect();
        assert_eq!(kept, vec!["Mystery Box", "Khichdi"]);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let catalog = vec![
            CatalogItem::new("First", &[]),
            CatalogItem::new("Second", &[]),
            CatalogItem::new("Third", &[]),
        ];
        let (ctx, profile, prefs, bandit) = (
            ContextSnapshot::default(),
            ProfileTags::default(),
            PreferenceModel::new(),
            BanditStats::new(),
        );
        let inputs = ScoringInputs {
            context: &ctx,
            profile: &profile,
            preferences: &prefs,
            bandit: &bandit,
        };
        let ranked = rank(&catalog, &FilterPrefs::default(), &inputs, &mut FixedNovelty(0.0));
        let order: Vec<_> = ranked.iter().map(|r| r.position).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn parses_diet_preference() {
        let case = |name, input, expected| TestCase {
            name,
            input,
            expected,
        };
        let cases = vec![
            case("capitalized", "Veg", Some(DietPreference::Veg)),
            case("long form", "vegetarian", Some(DietPreference::Veg)),
            case("hyphenated", "non-veg", Some(DietPreference::NonVeg)),
            case("underscored", "non_veg", Some(DietPreference::NonVeg)),
            case("unsupported", "vegan", None),
        ];
        run_table_tests(cases, DietPreference::parse).unwrap();
    }

    #[test]
    fn explicit_diet_excludes_other_labels() {
        let egg = CatalogItem::new("Egg Curry", &[]).with_diet(DietType::Other);
        for diet in [DietPreference::Veg, DietPreference::NonVeg] {
            let filter = FilterPrefs {
                diet: Some(diet),
                satvik_only: false,
            };
            assert!(!filter.admits(&egg));
        }
        assert!(FilterPrefs::default().admits(&egg));
    }

    #[test]
    fn satvik_only_keeps_untagged_items_in_ranking() {
        let catalog = vec![
            CatalogItem::new("Masala Fries", &["high-sodium"]),
            CatalogItem::new("Plain Curd", &[]),
            CatalogItem::new("Khichdi", &["satvik"]),
        ];
        let (ctx, profile, prefs, bandit) = (
            ContextSnapshot::default(),
            ProfileTags::default(),
            PreferenceModel::new(),
            BanditStats::new(),
        );
        let inputs = ScoringInputs {
            context: &ctx,
            profile: &profile,
            preferences: &prefs,
            bandit: &bandit,
        };
        let filter = FilterPrefs {
            diet: None,
            satvik_only: true,
        };
        let ranked = rank(&catalog, &filter, &inputs, &mut FixedNovelty(0.0));
        let titles: Vec<_> = ranked.iter().map(|r| r.item.title.as_str()).collect();
        assert_eq!(titles, vec!["Khichdi", "Plain Curd"]);
    }
}
