use std::sync::Arc;

use mapsy_common::{CallbackPayload, ExtractionRequest, PlaceDetail};
use mapsy_pipeline::testing::{
    MockBackend, MockReply, MockScraper, MockSearcher, RecordingCallback,
};
use mapsy_pipeline::{Orchestrator, PlaceNameExtractor, PlaceResolver, ScraperSet, Stage};
use uuid::Uuid;

const POST_URL: &str = "https://www.instagram.com/p/DPH8dSnE9AV/";

struct Harness {
    backend: Arc<MockBackend>,
    searcher: Arc<MockSearcher>,
    callback: Arc<RecordingCallback>,
    orchestrator: Orchestrator,
}

fn harness(scraper: MockScraper, replies: Vec<MockReply>, searcher: MockSearcher) -> Harness {
    let backend = Arc::new(MockBackend::new(replies));
    let searcher = Arc::new(searcher);
    let callback = Arc::new(RecordingCallback::accepting());
    let orchestrator = Orchestrator::new(
        ScraperSet::new().with_instagram(Arc::new(scraper)),
        PlaceNameExtractor::new(backend.clone()),
        PlaceResolver::new(searcher.clone()),
        callback.clone(),
    );
    Harness {
        backend,
        searcher,
        callback,
        orchestrator,
    }
}

fn only_payload(callback: &RecordingCallback) -> CallbackPayload {
    let payloads = callback.payloads();
    assert_eq!(payloads.len(), 1, "exactly one callback per run");
    payloads.into_iter().next().unwrap()
}

#[tokio::test]
async fn ramen_post_resolves_one_place() {
    let h = harness(
        MockScraper::with_caption("Great ramen at #IchiranTokyo today"),
        vec![MockReply::json(
            r#"{"place_names": ["IchiranTokyo"], "has_places": true}"#,
        )],
        MockSearcher::new().on_place("IchiranTokyo", PlaceDetail::new("1", "Ichiran Shibuya")),
    );
    let id = Uuid::new_v4();

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(id, POST_URL))
        .await;

    assert_eq!(report.content_id, id);
    assert_eq!(report.final_stage, Stage::Delivered);
    assert!(report.delivered);

    let json = serde_json::to_value(only_payload(&h.callback)).unwrap();
    assert_eq!(json["resultStatus"], "SUCCESS");
    assert_eq!(json["contentId"], id.to_string());
    assert_eq!(json["snsInfo"]["platform"], "INSTAGRAM");
    assert_eq!(json["snsInfo"]["contentType"], "post");
    assert_eq!(json["placeDetails"][0]["name"], "Ichiran Shibuya");
    assert_eq!(
        json["statistics"],
        serde_json::json!({
            "extractedPlaceNames": ["IchiranTokyo"],
            "totalExtracted": 1,
            "totalFound": 1,
            "failedSearches": []
        })
    );
}

#[tokio::test]
async fn empty_caption_skips_backend_and_search() {
    let h = harness(MockScraper::with_caption(""), vec![], MockSearcher::new());

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;

    assert_eq!(report.final_stage, Stage::Delivered);
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.searcher.calls(), 0);

    match only_payload(&h.callback) {
        CallbackPayload::Success {
            place_details,
            statistics,
            ..
        } => {
            assert!(place_details.is_empty());
            assert_eq!(statistics.total_extracted, 0);
            assert_eq!(statistics.total_found, 0);
            assert!(statistics.failed_searches.is_empty());
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_caption_behaves_like_empty() {
    let h = harness(MockScraper::without_caption(), vec![], MockSearcher::new());
    h.orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;
    assert_eq!(h.backend.calls(), 0);
    assert!(only_payload(&h.callback).is_success());
}

#[tokio::test]
async fn one_of_two_places_fails() {
    let h = harness(
        MockScraper::with_caption("#스시호 and #사사노하"),
        vec![MockReply::json(
            r#"{"place_names": ["스시호", "사사노하"], "has_places": true}"#,
        )],
        MockSearcher::new().on_place("사사노하", PlaceDetail::new("22", "사사노하")),
    );

    h.orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;

    match only_payload(&h.callback) {
        CallbackPayload::Success {
            place_details,
            statistics,
            ..
        } => {
            assert_eq!(place_details.len(), 1);
            assert_eq!(statistics.total_found, 1);
            assert_eq!(statistics.total_extracted, 2);
            assert_eq!(statistics.failed_searches, vec!["스시호"]);
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(h.searcher.queries(), vec!["스시호", "사사노하"]);
}

#[tokio::test]
async fn extraction_exhaustion_still_succeeds() {
    let h = harness(
        MockScraper::with_caption("some caption"),
        vec![
            MockReply::Error("down".into()),
            MockReply::NoContent,
            MockReply::json("{}"),
        ],
        MockSearcher::new(),
    );

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;

    assert_eq!(report.final_stage, Stage::Delivered);
    assert_eq!(h.backend.calls(), 3);
    assert_eq!(h.searcher.calls(), 0);
    assert!(only_payload(&h.callback).is_success());
}

#[tokio::test]
async fn scrape_failure_sends_failed_payload() {
    let h = harness(
        MockScraper::failing("Instagram responded with 429"),
        vec![],
        MockSearcher::new(),
    );
    let id = Uuid::new_v4();

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(id, POST_URL))
        .await;

    assert_eq!(report.final_stage, Stage::Failed);
    assert!(report.delivered);
    assert_eq!(h.backend.calls(), 0);

    let json = serde_json::to_value(only_payload(&h.callback)).unwrap();
    assert_eq!(json["resultStatus"], "FAILED");
    assert_eq!(json["contentId"], id.to_string());
    assert!(json["errorMessage"]
        .as_str()
        .unwrap()
        .contains("Instagram responded with 429"));
    assert!(json.get("placeDetails").is_none());
    assert!(json.get("statistics").is_none());
}

#[tokio::test]
async fn unsupported_platform_is_reported_as_failure() {
    let h = harness(MockScraper::with_caption("x"), vec![], MockSearcher::new());

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(
            Uuid::new_v4(),
            "https://www.youtube.com/shorts/abc123",
        ))
        .await;

    assert_eq!(report.final_stage, Stage::Failed);
    match only_payload(&h.callback) {
        CallbackPayload::Failed { error_message, .. } => {
            assert!(error_message.contains("not implemented"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn panic_inside_pipeline_becomes_failed_payload() {
    let h = harness(
        MockScraper::panicking("selector engine exploded"),
        vec![],
        MockSearcher::new(),
    );

    let report = h
        .orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;

    assert_eq!(report.final_stage, Stage::Failed);
    match only_payload(&h.callback) {
        CallbackPayload::Failed { error_message, .. } => {
            assert_eq!(error_message, "selector engine exploded");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_callback_is_reported_not_retried() {
    let callback = Arc::new(RecordingCallback::rejecting());
    let orchestrator = Orchestrator::new(
        ScraperSet::new().with_instagram(Arc::new(MockScraper::with_caption(""))),
        PlaceNameExtractor::new(Arc::new(MockBackend::new(vec![]))),
        PlaceResolver::new(Arc::new(MockSearcher::new())),
        callback.clone(),
    );

    let report = orchestrator
        .run(ExtractionRequest::new(Uuid::new_v4(), POST_URL))
        .await;

    assert!(!report.delivered);
    assert_eq!(callback.payloads().len(), 1);
}
