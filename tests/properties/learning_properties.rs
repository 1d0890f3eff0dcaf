use std::sync::Arc;

use proptest::prelude::*;

use nutripick::learning::{
    BanditStats, FeedbackSignal, PREFERENCE_MAX, PREFERENCE_MIN, PreferenceModel, PreferenceStore,
};
use nutripick::scoring::BANDIT_WEIGHT;
use nutripick::storage::MemoryStore;

fn signal() -> impl Strategy<Value = FeedbackSignal> {
    prop_oneof![Just(FeedbackSignal::Like), Just(FeedbackSignal::Skip)]
}

fn bandit_term(bandit: &BanditStats, tag: &str) -> f64 {
    BANDIT_WEIGHT * bandit.rate(tag)
}

proptest! {
    #[test]
    fn preference_weight_stays_in_band(signals in prop::collection::vec(signal(), 0..80)) {
        let mut model = PreferenceModel::new();
        for signal in signals {
            let weight = model.nudge("satvik", signal.delta());
            prop_assert!((PREFERENCE_MIN..=PREFERENCE_MAX).contains(&weight));
        }
        prop_assert!((PREFERENCE_MIN..=PREFERENCE_MAX).contains(&model.weight("satvik")));
    }

    #[test]
    fn like_never_lowers_and_skip_never_raises_bandit_term(
        shown in 0u64..50,
        prior_likes in 0usize..10,
        signal in signal(),
    ) {
        let mut store = PreferenceStore::load(Arc::new(MemoryStore::new())).unwrap();
        let shown_tags: Vec<&str> = std::iter::repeat_n("light-clean", shown as usize).collect();
        store.record_shown(shown_tags).unwrap();
        for _ in 0..prior_likes {
            store.apply_feedback(&["light-clean"], FeedbackSignal::Like).unwrap();
        }
        let before = bandit_term(store.bandit(), "light-clean");
        store.apply_feedback(&["light-clean"], signal).unwrap();
        let after = bandit_term(store.bandit(), "light-clean");
        match signal {
            FeedbackSignal::Like => prop_assert!(after >= before),
            FeedbackSignal::Skip => prop_assert!(after <= before),
        }
    }

    #[test]
    fn exposures_alone_never_raise_the_rate(shown in 0u64..200) {
        let mut bandit = BanditStats::new();
        let mut last = bandit.rate("satvik");
        for _ in 0..shown {
            bandit.record_shown("satvik");
            let rate = bandit.rate("satvik");
            prop_assert!(rate <= last);
            last = rate;
        }
    }
}

#[test]
fn three_likes_from_fresh_store() {
    let mut store = PreferenceStore::load(Arc::new(MemoryStore::new())).unwrap();
    for _ in 0..3 {
        store
            .apply_feedback(&["satvik"], FeedbackSignal::Like)
            .unwrap();
    }
    assert_eq!(store.model().weight("satvik"), 6.0);
    assert_eq!(store.bandit().get("satvik").success, 3);
    // likes without exposures push success past shown
    assert!(store.bandit().get("satvik").success > store.bandit().get("satvik").shown);
}
