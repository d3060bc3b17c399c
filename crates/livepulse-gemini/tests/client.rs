//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use chrono::{TimeZone, Utc};
use livepulse_analytics::{NarrativeGenerator, NarrativeInput, NarrativeSessionSummary};
use livepulse_gemini::{GeminiClient, NarrativeError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn test_client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "gemini-2.5-flash", 5, base_url)
        .expect("client construction should not fail")
        .with_retry(2, 0)
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

fn input() -> NarrativeInput {
    NarrativeInput {
        username: "rina".to_string(),
        sessions: vec![NarrativeSessionSummary {
            session_id: "s-1".to_string(),
            started_at: Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap(),
            last_score: 64.0,
            avg_engagement: 1.8,
            avg_retention: 0.7,
        }],
    }
}

#[tokio::test]
async fn generate_sends_prompt_and_returns_first_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(text_response("Performa akun stabil."))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .generate(&input())
        .await
        .expect("should generate");
    assert_eq!(text, "Performa akun stabil.");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("@rina"));
    assert!(prompt.contains("\"session_id\": \"s-1\""));
}

#[tokio::test]
async fn generate_text_posts_contents_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(serde_json::json!({
            "contents": [{ "parts": [{ "text": "hello" }] }]
        })))
        .respond_with(text_response("hi"))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .generate_text("hello")
        .await
        .expect("should generate");
    assert_eq!(text, "hi");
}

#[tokio::test]
async fn overload_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("after retry"))
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .generate_text("p")
        .await
        .expect("should succeed after one retry");
    assert_eq!(text, "after retry");
}

#[tokio::test]
async fn persistent_rate_limit_surfaces_as_overloaded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate_text("p")
        .await
        .unwrap_err();
    assert!(matches!(err, NarrativeError::Overloaded { status: 429 }));
    assert!(err.is_overloaded());
}

#[tokio::test]
async fn client_error_is_not_retried_and_body_is_truncated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("k".repeat(600)))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate_text("p")
        .await
        .unwrap_err();
    match err {
        NarrativeError::UpstreamStatus { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_text_is_missing_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "candidates": [{ "finishReason": "SAFETY" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate_text("p")
        .await
        .unwrap_err();
    assert!(matches!(err, NarrativeError::MissingText));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate_text("p")
        .await
        .unwrap_err();
    assert!(matches!(err, NarrativeError::Deserialize { .. }));
}

#[tokio::test]
async fn transport_error_does_not_expose_api_key() {
    let client =
        GeminiClient::with_base_url("TOPSECRETKEY", "gemini-2.5-flash", 2, "http://127.0.0.1:1")
            .expect("client construction should not fail")
            .with_retry(0, 0);

    let err = client
        .generate_text("hi")
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(err, NarrativeError::Http(_)));
    assert!(!err.to_string().contains("TOPSECRETKEY"));
    assert!(!format!("{err:?}").contains("TOPSECRETKEY"));
}

#[tokio::test]
async fn api_key_is_not_sent_in_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("ok"))
        .mount(&server)
        .await;

    test_client(&server.uri())
        .generate_text("hello")
        .await
        .expect("should generate");

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests[0].url.query().is_none());
}
