//! Ollama client against a wiremock `/api/chat`.

use std::time::Duration;

use ai_client::{Message, Ollama, StructuredChat};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, JsonSchema)]
struct PlaceNames {
    place_names: Vec<String>,
    has_places: bool,
}

fn ollama_for(server: &MockServer) -> Ollama {
    Ollama::new("gemma3:1b-it-qat")
        .with_chat_url(format!("{}/api/chat", server.uri()))
        .with_api_key("test-key")
        .with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn structured_chat_sends_schema_and_returns_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("X-API-KEY", "test-key"))
        .and(body_partial_json(json!({
            "model": "gemma3:1b-it-qat",
            "stream": false,
            "format": { "type": "object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "{\"place_names\":[\"Ichiran\"],\"has_places\":true}"
            },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let schema = json!({ "type": "object" });
    let content = ollama_for(&server)
        .structured_chat(vec![Message::user("find places")], schema)
        .await
        .unwrap();

    assert_eq!(
        content.as_deref(),
        Some("{\"place_names\":[\"Ichiran\"],\"has_places\":true}")
    );
}

#[tokio::test]
async fn missing_message_yields_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
        .mount(&server)
        .await;

    let content = ollama_for(&server)
        .structured_chat(vec![Message::user("x")], json!({}))
        .await
        .unwrap();

    assert!(content.is_none());
}

#[tokio::test]
async fn server_error_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let err = ollama_for(&server)
        .structured_chat(vec![Message::user("x")], json!({}))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("503"), "unexpected error: {msg}");
    assert!(msg.contains("model loading"), "unexpected error: {msg}");
}

#[tokio::test]
async fn extract_parses_fenced_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "```json\n{\"place_names\":[],\"has_places\":false}\n```"
            }
        })))
        .mount(&server)
        .await;

    let parsed: PlaceNames = ollama_for(&server).extract("nothing here").await.unwrap();
    assert!(parsed.place_names.is_empty());
    assert!(!parsed.has_places);
}
