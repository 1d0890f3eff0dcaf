use std::collections::BTreeSet;

use proptest::prelude::*;

use nutripick::catalog::{CatalogItem, DietType};
use nutripick::context::{ActivityLevel, ContextSnapshot, FLAG_HIGH_BP, FLAG_LOW_ACTIVITY, ProfileTags};
use nutripick::learning::{BanditStats, PreferenceModel};
use nutripick::ranking::{DietPreference, FilterPrefs, rank};
use nutripick::scoring::{FixedNovelty, SUITABILITY_WEIGHT, ScoringInputs, score};

const TAGS: &[&str] = &[
    "satvik",
    "low-sodium",
    "high-sodium",
    "light-clean",
    "high-protein-snack",
    "low-carb",
    "spicy",
];

fn tag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(TAGS)
}

fn diet() -> impl Strategy<Value = Option<DietType>> {
    prop_oneof![Just(None), Just(Some(DietType::Veg)), Just(Some(DietType::NonVeg))]
}

fn item() -> impl Strategy<Value = CatalogItem> {
    (
        "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,8})?",
        prop::collection::vec(tag(), 0..4),
        diet(),
        prop::option::of(0.0f64..10.0),
    )
        .prop_map(|(title, tags, diet, suitability)| {
            let mut item = CatalogItem::new(title, &tags);
            item.diet = diet;
            item.suitability = suitability;
            item
        })
}

fn context() -> impl Strategy<Value = ContextSnapshot> {
    (
        prop::option::of(0.0f64..1500.0),
        prop::option::of(90.0f64..190.0),
        prop::option::of(50.0f64..120.0),
        prop_oneof![
            Just(None),
            Just(Some(ActivityLevel::Low)),
            Just(Some(ActivityLevel::Moderate)),
            Just(Some(ActivityLevel::High)),
        ],
    )
        .prop_map(|(calories_burned, bp_systolic, bp_diastolic, activity_level)| ContextSnapshot {
            calories_burned,
            bp_systolic,
            bp_diastolic,
            activity_level,
            ..ContextSnapshot::default()
        })
}

fn profile() -> impl Strategy<Value = ProfileTags> {
    (prop::collection::vec(tag(), 0..3), any::<bool>(), any::<bool>()).prop_map(
        |(tags, high_bp, low_activity)| {
            let mut medical_flags = BTreeSet::new();
            if high_bp {
                medical_flags.insert(FLAG_HIGH_BP.to_string());
            }
            if low_activity {
                medical_flags.insert(FLAG_LOW_ACTIVITY.to_string());
            }
            ProfileTags {
                tags: tags.into_iter().map(str::to_string).collect(),
                medical_flags,
                reasoning: String::new(),
            }
        },
    )
}

fn preferences() -> impl Strategy<Value = PreferenceModel> {
    prop::collection::vec((tag(), prop_oneof![Just(1i8), Just(-1i8)]), 0..20).prop_map(|events| {
        let mut model = PreferenceModel::new();
        for (tag, delta) in events {
            model.nudge(tag, delta);
        }
        model
    })
}

proptest! {
    #[test]
    fn untagged_item_scores_novelty_plus_suitability(
        ctx in context(),
        profile in profile(),
        prefs in preferences(),
        suitability in prop::option::of(0.0f64..10.0),
        novelty in 0.0f64..1.5,
    ) {
        let mut item = CatalogItem::new("Plain Plate", &[]);
        item.suitability = suitability;
        let bandit = BanditStats::new();
        let inputs = ScoringInputs {
            context: &ctx,
            profile: &profile,
            preferences: &prefs,
            bandit: &bandit,
        };
        let expected = novelty + suitability.map_or(0.0, |s| SUITABILITY_WEIGHT * s);
        let actual = score(&item, &inputs, &mut FixedNovelty(novelty));
        prop_assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn ranking_is_deterministic_and_sorted(
        catalog in prop::collection::vec(item(), 0..25),
        ctx in context(),
        profile in profile(),
        prefs in preferences(),
    ) {
        let bandit = BanditStats::new();
        let inputs = ScoringInputs {
            context: &ctx,
            profile: &profile,
            preferences: &prefs,
            bandit: &bandit,
        };
        let filter = FilterPrefs::default();
        let first = rank(&catalog, &filter, &inputs, &mut FixedNovelty(0.0));
        let second = rank(&catalog, &filter, &inputs, &mut FixedNovelty(0.0));

        let positions: Vec<usize> = first.iter().map(|r| r.position).collect();
        let again: Vec<usize> = second.iter().map(|r| r.position).collect();
        prop_assert_eq!(&positions, &again);
        prop_assert_eq!(first.len(), catalog.len());
        for pair in first.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].position < pair[1].position);
            }
        }
    }

    #[test]
    fn veg_filter_drops_only_nonveg(catalog in prop::collection::vec(item(), 0..25)) {
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
            diet: Some(DietPreference::Veg),
            satvik_only: false,
        };
        let ranked = rank(&catalog, &filter, &inputs, &mut FixedNovelty(0.0));
        let kept = catalog
            .iter()
            .filter(|item| item.diet != Some(DietType::NonVeg))
            .count();
        prop_assert_eq!(ranked.len(), kept);
        prop_assert!(ranked.iter().all(|r| r.item.diet != Some(DietType::NonVeg)));
    }
}

#[test]
fn low_sodium_under_mildly_elevated_pressure() {
    let item = CatalogItem::new("Clear Soup", &["low-sodium"]);
    let ctx = ContextSnapshot {
        bp_systolic: Some(135.0),
        ..ContextSnapshot::default()
    };
    let (profile, prefs, bandit) = (
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
    let total = score(&item, &inputs, &mut FixedNovelty(0.75));
    assert!((12.0..=13.5).contains(&total));
}
