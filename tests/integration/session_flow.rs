use std::sync::Arc;

use nutripick::cache::{DEFAULT_MACRO_TTL, MacroLookup};
use nutripick::catalog::Macros;
use nutripick::context::{ContextSnapshot, ProfileTags};
use nutripick::learning::{FeedbackSignal, PreferenceStore};
use nutripick::ranking::{Recommender, RefreshReason};
use nutripick::scoring::FixedNovelty;
use nutripick::storage::{KeyValueStore, MemoryStore, SqliteStore};
use nutripick::test_utils::fixtures::{
    CountingCollaborators, elevated_context, high_bp_profile, sample_catalog,
};

fn session(
    store: Arc<dyn KeyValueStore>,
    collaborators: Arc<CountingCollaborators>,
    page_size: usize,
) -> Recommender {
    let preferences = PreferenceStore::load(store.clone()).unwrap();
    let macros =
        Arc::new(MacroLookup::load(store, collaborators, DEFAULT_MACRO_TTL).unwrap());
    let context: ContextSnapshot = serde_json::from_value(elevated_context()).unwrap();
    let profile: ProfileTags = serde_json::from_value(high_bp_profile()).unwrap();
    Recommender::new(
        sample_catalog(),
        preferences,
        macros,
        Box::new(FixedNovelty(0.0)),
        page_size,
    )
    .with_context(context, profile)
}

fn ids(session: &Recommender) -> Vec<String> {
    session
        .ranked()
        .iter()
        .map(|r| r.item.id.clone())
        .collect()
}

#[tokio::test]
async fn render_prefetches_missing_macros_once() {
    let collaborators =
        Arc::new(CountingCollaborators::new().with_macros(Macros::new(111.0, 9.0, 12.0, 4.0)));
    let mut session = session(Arc::new(MemoryStore::new()), collaborators.clone(), 10);

    let kcal: Vec<f64> = session
        .render_page()
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.item.macros.map_or(0.0, |m| m.kcal))
        .collect();
    assert_eq!(kcal.len(), 5);
    assert_eq!(kcal.iter().filter(|&&k| k == 111.0).count(), 4);
    assert!(kcal.contains(&250.0));
    assert_eq!(collaborators.calls().nutrition, 4);

    session.render_page().await.unwrap();
    assert_eq!(collaborators.calls().nutrition, 4);
    assert_eq!(session.preferences().bandit().get("satvik").shown, 2);
}

#[tokio::test]
async fn external_scores_are_fetched_once_per_item() {
    let collaborators = Arc::new(CountingCollaborators::new().with_suitability(5.0));
    let mut session = session(Arc::new(MemoryStore::new()), collaborators.clone(), 10);
    let before = ids(&session);

    assert_eq!(session.score_external(collaborators.as_ref(), 3).await, 5);
    assert_eq!(session.score_external(collaborators.as_ref(), 3).await, 0);
    assert_eq!(collaborators.calls().suitability, 5);
    assert_eq!(ids(&session), before);
    assert!(session.catalog().iter().all(|item| item.suitability == Some(5.0)));
}

#[tokio::test]
async fn failing_scorer_pins_zero() {
    let collaborators = Arc::new(CountingCollaborators::failing());
    let mut session = session(Arc::new(MemoryStore::new()), collaborators.clone(), 10);

    assert_eq!(session.score_external(collaborators.as_ref(), 1).await, 5);
    assert!(session.catalog().iter().all(|item| item.suitability == Some(0.0)));
    // failing nutrition still renders, from templates
    let entries = session.render_page().await.unwrap();
    assert_eq!(entries[0].item.macros.map(|m| m.kcal), Some(80.0));
}

#[tokio::test]
async fn learning_survives_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nutripick.db");
    let collaborators = Arc::new(CountingCollaborators::new());

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
        let mut first = session(store, collaborators.clone(), 10);
        for _ in 0..10 {
            first.feedback("masala-fries", FeedbackSignal::Like).unwrap();
        }
        assert_eq!(ids(&first)[0], "masala-fries");
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let second = session(store, collaborators, 10);
    assert_eq!(second.preferences().model().weight("high-sodium"), 20.0);
    assert_eq!(ids(&second)[0], "masala-fries");
}

#[tokio::test]
async fn background_poll_keeps_page_while_feedback_resets_it() {
    let mut session = session(
        Arc::new(MemoryStore::new()),
        Arc::new(CountingCollaborators::new()),
        2,
    );
    assert!(session.next_page());
    assert_eq!(session.pager().page(), 1);

    let context = session.context().clone();
    let profile = session.profile().clone();
    session.refresh_context(context, profile, true);
    assert_eq!(session.pager().page(), 1);

    session.refresh(RefreshReason::Scheduled);
    assert_eq!(session.pager().page(), 0);

    session.set_page(2);
    session.feedback("plain-curd", FeedbackSignal::Skip).unwrap();
    assert_eq!(session.pager().page(), 0);
}
