//! Vision client tests against a mocked completion API

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookscan_server::config::VisionConfig;
use bookscan_server::vision::{VisionClient, VisionError};

const IMAGE_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

fn test_config(server: &MockServer, timeout_secs: u64) -> VisionConfig {
    VisionConfig {
        api_key: "sk-test".to_string(),
        model: "gpt-4o-mini".to_string(),
        max_tokens: 500,
        api_url: format!("{}/v1/chat/completions", server.uri()),
        timeout_secs,
    }
}

/// A well-formed chat-completion envelope wrapping the given reply text
fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": { "role": "assistant", "content": content }
        }]
    })
}

#[tokio::test]
async fn test_detect_parses_chatty_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "Sure, here are the books I can identify:\n\
             [{\"title\": \"Dune\", \"author\": \"Frank Herbert\"},\n\
              {\"title\": \"Neuromancer\", \"author\": \"William Gibson\"}]\n\
             Let me know if you need anything else!",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let candidates = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].title.as_deref(), Some("Dune"));
    assert_eq!(candidates[1].author.as_deref(), Some("William Gibson"));
}

#[tokio::test]
async fn test_detect_preserves_missing_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "[{\"title\": \"Dune\"}, {\"author\": \"Unknown\"}]",
        )))
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let candidates = client.detect(IMAGE_BYTES, "image/png").await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].author, None);
    assert_eq!(candidates[1].title, None);
}

#[tokio::test]
async fn test_detect_reply_without_array_is_extraction_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "I can see a bookshelf, but none of the spines are readable.",
        )))
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let err = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap_err();

    match err {
        VisionError::Extraction { raw } => assert!(raw.contains("bookshelf")),
        other => panic!("expected Extraction, got {:?}", other),
    }
}

#[tokio::test]
async fn test_detect_malformed_envelope_is_extraction_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let err = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap_err();

    assert!(matches!(err, VisionError::Extraction { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_detect_empty_choices_is_extraction_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let err = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap_err();

    assert!(matches!(err, VisionError::Extraction { .. }));
}

#[tokio::test]
async fn test_detect_upstream_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "internal" })),
        )
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 5)).unwrap();
    let err = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap_err();

    match &err {
        VisionError::Upstream(msg) => assert!(msg.contains("500")),
        other => panic!("expected Upstream, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_detect_timeout_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("[]"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = VisionClient::new(test_config(&server, 1)).unwrap();
    let err = client.detect(IMAGE_BYTES, "image/jpeg").await.unwrap_err();

    match &err {
        VisionError::Upstream(msg) => assert!(msg.contains("timed out")),
        other => panic!("expected Upstream, got {:?}", other),
    }
    assert!(err.is_retryable());
}
