use std::time::Duration;

use mapsy_common::CallbackPayload;
use mapsy_pipeline::{CallbackOutcome, CallbackSender, HttpCallbackDispatcher};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(url: &str, timeout: Duration) -> HttpCallbackDispatcher {
    HttpCallbackDispatcher::new(url, "backend-key", timeout).unwrap()
}

#[tokio::test]
async fn posts_payload_with_api_key() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/api/ai/callback"))
        .and(header("X-API-Key", "backend-key"))
        .and(body_partial_json(serde_json::json!({
            "contentId": id,
            "resultStatus": "FAILED",
            "errorMessage": "scrape failed"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let callback = dispatcher(
        &format!("{}/api/ai/callback", server.uri()),
        Duration::from_secs(5),
    );
    let outcome = callback
        .deliver(&CallbackPayload::failed(id, "scrape failed"))
        .await;
    assert_eq!(outcome, CallbackOutcome::Delivered(200));
}

#[tokio::test]
async fn non_2xx_is_rejected_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .expect(1)
        .mount(&server)
        .await;

    let callback = dispatcher(&server.uri(), Duration::from_secs(5));
    let payload = CallbackPayload::failed(Uuid::new_v4(), "x");

    assert_eq!(
        callback.deliver(&payload).await,
        CallbackOutcome::Rejected {
            status: 500,
            body: "db down".into()
        }
    );
}

#[tokio::test]
async fn slow_receiver_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let callback = dispatcher(&server.uri(), Duration::from_millis(200));
    let payload = CallbackPayload::failed(Uuid::new_v4(), "x");

    assert_eq!(callback.deliver(&payload).await, CallbackOutcome::Timeout);
    assert!(!callback.send(&payload).await);
}

#[tokio::test]
async fn unreachable_receiver_is_transport_error() {
    // Bind then drop so nothing listens on the port.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let callback = dispatcher(&format!("http://{addr}/cb"), Duration::from_secs(2));
    let outcome = callback
        .deliver(&CallbackPayload::failed(Uuid::new_v4(), "x"))
        .await;
    assert!(matches!(outcome, CallbackOutcome::Transport(_)));
}

#[tokio::test]
async fn send_maps_delivery_to_bool() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let callback = dispatcher(&server.uri(), Duration::from_secs(5));
    assert!(
        callback
            .send(&CallbackPayload::failed(Uuid::new_v4(), "x"))
            .await
    );
}
