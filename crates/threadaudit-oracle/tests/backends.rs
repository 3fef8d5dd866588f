//! Integration tests for the HTTP oracle backends.
//!
//! Uses wiremock for HTTP mocking. Tests cover request shape, judgment
//! extraction, status mapping, and client-side timeouts.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use threadaudit_contracts::{
    oracle::{OracleError, OracleRequest},
    step::StepId,
};
use threadaudit_core::ReasoningOracle;
use threadaudit_oracle::{build_oracle, OracleConfig, OracleProvider};

fn request(timeout: Duration) -> OracleRequest {
    OracleRequest {
        step_id: StepId::new("transit_visa_advisory"),
        step_title: "Transit Visa Advisory".into(),
        prompt: "Did the agent advise on transit visas?".into(),
        transcript: Arc::from("--- Message 1 of 1 ---\nFrom: customer@mail.example\n\nFly me to Sydney via Doha."),
        max_score: 5.4,
        profile: None,
        timeout,
    }
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

async fn openai_against(server: &MockServer) -> Arc<dyn ReasoningOracle> {
    let config = OracleConfig::new(OracleProvider::OpenAi, "test-key").with_base_url(server.uri());
    build_oracle(config).expect("failed to build oracle")
}

// ── OpenAI-compatible ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_judgment_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o", "temperature": 0.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "```json\n{\"score\": 5.4, \"passed\": true, \"rationale\": \"Visa advice given for Doha.\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = openai_against(&server).await;
    let judgment = oracle
        .judge(&request(Duration::from_secs(5)))
        .await
        .expect("judge failed");

    assert_eq!(judgment.score, 5.4);
    assert!(judgment.passed);
    assert_eq!(judgment.rationale, "Visa advice given for Doha.");
    assert_eq!(oracle.provider_name(), "openai");
}

#[tokio::test]
async fn test_openai_server_error_is_transport() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let err = openai_against(&server)
        .await
        .judge(&request(Duration::from_secs(5)))
        .await
        .unwrap_err();

    match err {
        OracleError::Transport { reason } => {
            assert!(reason.contains("503"), "reason: {reason}");
            assert!(reason.contains("upstream overloaded"), "reason: {reason}");
        }
        other => panic!("expected Transport, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_missing_content_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = openai_against(&server)
        .await
        .judge(&request(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_openai_unparsable_judgment_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_completion("I think it went well.")),
        )
        .mount(&server)
        .await;

    let err = openai_against(&server)
        .await
        .judge(&request(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_openai_slow_response_is_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("{\"score\": 1, \"passed\": true, \"rationale\": \"x\"}"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = openai_against(&server)
        .await
        .judge(&request(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert_eq!(err, OracleError::Timeout { timeout_ms: 200 });
}

#[tokio::test]
async fn test_groq_uses_its_own_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .and(body_partial_json(json!({ "model": "meta-llama/llama-4-scout-17b-16e-instruct" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "{\"score\": 0, \"passed\": false, \"rationale\": \"No advice.\"}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = OracleConfig::new(OracleProvider::Groq, "gsk-test").with_base_url(server.uri());
    let oracle = build_oracle(config).unwrap();
    let judgment = oracle.judge(&request(Duration::from_secs(5))).await.unwrap();
    assert!(!judgment.passed);
    assert_eq!(oracle.provider_name(), "groq");
}

// ── Anthropic ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anthropic_judgment_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "model": "claude-3-opus-20240229", "max_tokens": 4096 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "text", "text": "{\"score\": 2.7, \"passed\": false, \"rationale\": \"Partial advice.\", \"improvements\": \"Check Qatar transit rules.\"}" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = OracleConfig::new(OracleProvider::Anthropic, "ak-test").with_base_url(server.uri());
    let oracle = build_oracle(config).unwrap();
    let judgment = oracle.judge(&request(Duration::from_secs(5))).await.unwrap();

    assert_eq!(judgment.score, 2.7);
    assert!(!judgment.passed);
    assert_eq!(judgment.improvements.as_deref(), Some("Check Qatar transit rules."));
    assert_eq!(oracle.provider_name(), "anthropic");
}

#[tokio::test]
async fn test_anthropic_without_text_block_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
        .mount(&server)
        .await;

    let config = OracleConfig::new(OracleProvider::Anthropic, "ak-test").with_base_url(server.uri());
    let err = build_oracle(config)
        .unwrap()
        .judge(&request(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_transport() {
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let config = OracleConfig::new(OracleProvider::OpenAi, "k").with_base_url("http://127.0.0.1:9");
    let err = build_oracle(config)
        .unwrap()
        .judge(&request(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Transport { .. }), "got {err:?}");
}
