//! Inference client and sidecar analyzer tests against a mocked
//! chat-completions endpoint.

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cq_gateway::core::inference::{
    ChatMessage, ChatRequest, InferenceClient, InferenceConfig, InferenceError,
};
use cq_gateway::core::relay::Turn;
use cq_gateway::core::sidecar::SidecarAnalyzer;

const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

fn client_for(server: &MockServer) -> InferenceClient {
    InferenceClient::new(InferenceConfig {
        api_key: "gsk_test".to_string(),
        api_url: format!("{}{COMPLETIONS_PATH}", server.uri()),
        model: "moonshotai/kimi-k2-instruct-0905".to_string(),
    })
    .unwrap()
}

fn simple_request() -> ChatRequest {
    ChatRequest {
        model: "moonshotai/kimi-k2-instruct-0905".to_string(),
        messages: vec![ChatMessage::user("hello")],
        temperature: None,
        max_completion_tokens: None,
        top_p: None,
        stream: false,
    }
}

fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"total_tokens": 42}
    })
}

#[tokio::test]
async fn test_complete_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(
            json!({"model": "moonshotai/kimi-k2-instruct-0905", "stream": false}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("result text")))
        .expect(1)
        .mount(&server)
        .await;

    let content = client_for(&server).complete(&simple_request()).await.unwrap();
    assert_eq!(content, "result text");
}

#[tokio::test]
async fn test_auth_failure_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete(&simple_request()).await.unwrap_err();
    match err {
        InferenceError::AuthenticationFailed(msg) => {
            assert!(msg.contains("Invalid API Key"));
            assert!(msg.contains("invalid_request_error"));
        }
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "tokens"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete(&simple_request()).await.unwrap_err();
    assert!(matches!(err, InferenceError::RateLimited(_)));
}

#[tokio::test]
async fn test_server_error_classified_as_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete(&simple_request()).await.unwrap_err();
    match err {
        InferenceError::Provider(msg) => assert!(msg.contains("503")),
        other => panic!("expected Provider, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete(&simple_request()).await.unwrap_err();
    assert!(matches!(err, InferenceError::Provider(_)));
}

#[tokio::test]
async fn test_empty_content_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete(&simple_request()).await.unwrap_err();
    assert!(matches!(err, InferenceError::Provider(_)));
}

#[tokio::test]
async fn test_analyzer_strips_fences_and_reports_snapshot_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "```json\n{\"phase\": \"CORE\", \"isComplete\": false}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = SidecarAnalyzer::new(Arc::new(client_for(&server)));
    let snapshot = vec![
        Turn::user("I prefer direct feedback"),
        Turn::assistant("Tell me more"),
        Turn::user("It saves everyone time"),
    ];

    let analysis = analyzer.analyze(&snapshot).await.unwrap();
    assert_eq!(analysis.turns_analyzed, 3);

    // Cleaned output is valid JSON, ready to inject unparsed.
    let value: Value = serde_json::from_str(&analysis.arguments).unwrap();
    assert_eq!(value["phase"], "CORE");

    // The request carried the fixed instruction and the snapshot.
    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Cultural Intelligence"));
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("I prefer direct feedback"));
    assert_eq!(body["temperature"], 0.6);
    assert_eq!(body["max_completion_tokens"], 4096);
}

#[tokio::test]
async fn test_analyzer_propagates_inference_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let analyzer = SidecarAnalyzer::new(Arc::new(client_for(&server)));
    let err = analyzer.analyze(&[Turn::user("hi")]).await.unwrap_err();
    assert!(matches!(err, InferenceError::Provider(_)));
}

#[tokio::test]
async fn test_analyzer_rejects_fence_only_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("```json\n```")))
        .mount(&server)
        .await;

    let analyzer = SidecarAnalyzer::new(Arc::new(client_for(&server)));
    let err = analyzer.analyze(&[Turn::user("hi")]).await.unwrap_err();
    match err {
        InferenceError::Provider(msg) => assert!(msg.contains("empty")),
        other => panic!("expected Provider, got {other:?}"),
    }
}
