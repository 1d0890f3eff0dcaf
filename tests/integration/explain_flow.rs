use std::sync::Arc;

use nutripick::cache::EvidenceLookup;
use nutripick::catalog::CatalogItem;
use nutripick::context::{ContextSnapshot, ProfileTags};
use nutripick::explain::{ExplanationPipeline, NarrativeSource};
use nutripick::storage::{KeyValueStore, MemoryStore};
use nutripick::test_utils::fixtures::{CountingCollaborators, high_bp_profile};

fn pipeline(
    store: Arc<dyn KeyValueStore>,
    collaborators: &Arc<CountingCollaborators>,
) -> ExplanationPipeline {
    let evidence = EvidenceLookup::load(store, collaborators.clone()).unwrap();
    ExplanationPipeline::new(Arc::new(evidence), collaborators.clone())
}

#[tokio::test]
async fn generated_narrative_and_short_evidence_title() {
    let collaborators = Arc::new(
        CountingCollaborators::new()
            .with_evidence(
                "Sodium reduction and blood pressure in adults with stage one hypertension",
                "https://pubmed.example/42",
                "Cutting sodium lowers pressure.",
            )
            .with_narrative("A gentle, low-salt bowl for today."),
    );
    let pipeline = pipeline(Arc::new(MemoryStore::new()), &collaborators);
    let profile: ProfileTags = serde_json::from_value(high_bp_profile()).unwrap();
    let item = CatalogItem::new("Clear Vegetable Soup", &["low-sodium"]);

    let record = pipeline
        .explain(&item, &ContextSnapshot::default(), &profile)
        .await
        .unwrap();
    assert_eq!(record.narrative_source, NarrativeSource::Generated);
    assert_eq!(
        record.composed_markup,
        "**Why this dish:** Low sodium supports your blood pressure goals; \
         Fits your low sodium needs. Based on your saved preferences.\n\n\
         **Evidence:** [Sodium reduction and blood pressure in adults with…]\
         (https://pubmed.example/42)\n\n\
         A gentle, low-salt bowl for today."
    );
}

#[tokio::test]
async fn evidence_cache_is_shared_through_the_store() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let collaborators = Arc::new(CountingCollaborators::new().with_evidence(
        "Salt study",
        "https://pubmed.example/7",
        "Less salt. Better pressure.",
    ));
    let item = CatalogItem::new("Steamed Idli", &["low-sodium"]);
    let (ctx, profile) = (ContextSnapshot::default(), ProfileTags::default());

    let first = pipeline(store.clone(), &collaborators)
        .explain(&item, &ctx, &profile)
        .await
        .unwrap();
    let second = pipeline(store, &collaborators)
        .explain(&item, &ctx, &profile)
        .await
        .unwrap();

    assert_eq!(first.evidence, second.evidence);
    assert_eq!(collaborators.calls().evidence, 1);
    assert_eq!(collaborators.calls().narrative, 2);
    assert_eq!(second.narrative_source, NarrativeSource::Fallback);
    assert!(second.narrative.starts_with("Less salt. Better pressure."));
}

#[tokio::test]
async fn failing_collaborators_fall_back_everywhere() {
    let collaborators = Arc::new(CountingCollaborators::failing());
    let pipeline = pipeline(Arc::new(MemoryStore::new()), &collaborators);
    let item = CatalogItem::new("Moong Dal Khichdi", &["satvik"]);

    let record = pipeline
        .explain(&item, &ContextSnapshot::default(), &ProfileTags::default())
        .await
        .unwrap();
    assert_eq!(record.narrative_source, NarrativeSource::Fallback);
    let evidence = record.evidence.as_ref().unwrap();
    assert!(evidence.url.starts_with("https://pubmed.ncbi.nlm.nih.gov/"));
    assert!(record.composed_markup.ends_with("Moong Dal Khichdi"));
}
