use httpmock::prelude::*;
use serde_json::json;

use nutripick::app::AppContext;
use nutripick::catalog::CatalogItem;
use nutripick::config::Config;
use nutripick::explain::NarrativeSource;
use nutripick::test_utils::fixtures::{
    UnitTestFixture, elevated_context, high_bp_profile, sample_catalog,
};

fn app(fixture: &UnitTestFixture, server: &MockServer, catalog: &[CatalogItem]) -> AppContext {
    let _ = fixture.write_catalog(catalog);
    let _ = fixture.write_context(&elevated_context());
    let _ = fixture.write_profile(&high_bp_profile());
    let mut config = Config::default();
    config.scoring.novelty_max = 0.0;
    config.collaborators.suitability_url = Some(server.url("/score"));
    config.collaborators.narrative_url = Some(server.url("/narrate"));
    AppContext::open(fixture.data_path.clone(), config, true, 0).unwrap()
}

#[tokio::test]
async fn remote_suitability_reorders_catalog() {
    let server = MockServer::start_async().await;
    let score = server
        .mock_async(|when, then| {
            when.method(POST).path("/score");
            then.status(200).json_body(json!({ "score": "20" }));
        })
        .await;
    // only the fries are unscored, so exactly one request goes out
    let catalog: Vec<CatalogItem> = sample_catalog()
        .into_iter()
        .map(|item| {
            if item.id == "masala-fries" {
                item
            } else {
                item.with_suitability(0.0)
            }
        })
        .collect();
    let fixture = UnitTestFixture::new();
    let ctx = app(&fixture, &server, &catalog);

    let mut session = ctx.recommender().unwrap();
    assert_eq!(session.ranked()[0].item.id, "clear-vegetable-soup");

    let scored = session
        .score_external(ctx.collaborators.as_ref(), 2)
        .await;
    assert_eq!(scored, 1);
    score.assert_async().await;
    assert_eq!(session.ranked()[0].item.id, "masala-fries");
    assert_eq!(session.item("masala-fries").unwrap().suitability, Some(20.0));
}

#[tokio::test]
async fn unreachable_scorer_pins_zero() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/score");
            then.status(500);
        })
        .await;
    let fixture = UnitTestFixture::new();
    let ctx = app(&fixture, &server, &sample_catalog());

    let mut session = ctx.recommender().unwrap();
    let scored = session
        .score_external(ctx.collaborators.as_ref(), 1)
        .await;
    assert_eq!(scored, 5);
    assert!(session.catalog().iter().all(|item| item.suitability == Some(0.0)));
    assert_eq!(session.ranked()[0].item.id, "clear-vegetable-soup");
}

#[tokio::test]
async fn remote_narrative_is_used_for_explanations() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/narrate");
            then.status(200)
                .json_body(json!({ "answer": "Warm, light and easy on your blood pressure." }));
        })
        .await;
    let fixture = UnitTestFixture::new();
    let ctx = app(&fixture, &server, &sample_catalog());
    let session = ctx.recommender().unwrap();
    let item = session.item("clear-vegetable-soup").unwrap();

    let pipeline = ctx.explanation_pipeline().unwrap();
    let record = pipeline
        .explain(item, session.context(), session.profile())
        .await
        .unwrap();
    assert_eq!(record.narrative_source, NarrativeSource::Generated);
    assert!(record
        .composed_markup
        .ends_with("Warm, light and easy on your blood pressure."));
    assert!(record.heuristic_line.ends_with(
        "Based on your calorie burn, blood pressure and activity."
    ));
}

#[tokio::test]
async fn sentinel_narrative_falls_back() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/narrate");
            then.status(200).body("No answer.");
        })
        .await;
    let fixture = UnitTestFixture::new();
    let ctx = app(&fixture, &server, &sample_catalog());
    let session = ctx.recommender().unwrap();
    let item = session.item("moong-dal-khichdi").unwrap();

    let record = ctx
        .explanation_pipeline()
        .unwrap()
        .explain(item, session.context(), session.profile())
        .await
        .unwrap();
    assert_eq!(record.narrative_source, NarrativeSource::Fallback);
    assert!(record.narrative.ends_with("Moong Dal Khichdi"));
}
