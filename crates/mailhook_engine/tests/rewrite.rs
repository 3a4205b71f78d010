use std::time::Duration;

use mailhook_engine::{ChatRewriter, RewriteError, RewriteSettings, Rewriter, BODY_PLACEHOLDER};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> RewriteSettings {
    RewriteSettings {
        api_key: Some("sk-test".to_string()),
        api_base: format!("{}/v1", server.uri()),
        model: "test-model".to_string(),
        prompt_template: format!("Rewrite:\n{BODY_PLACEHOLDER}"),
        ..RewriteSettings::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

#[tokio::test]
async fn rewrite_sends_prompt_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("no cap, big news")))
        .expect(1)
        .mount(&server)
        .await;

    let rewriter = ChatRewriter::new(settings(&server), Duration::from_secs(5)).unwrap();
    let out = rewriter.rewrite("Big news").await;
    assert_eq!(out, "no cap, big news");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 5000);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Rewrite:\nBig news");
}

#[tokio::test]
async fn rewrite_fails_open_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let rewriter = ChatRewriter::new(settings(&server), Duration::from_secs(5)).unwrap();
    assert_eq!(
        rewriter.try_rewrite("original").await,
        Err(RewriteError::HttpStatus(500))
    );
    assert_eq!(rewriter.rewrite("original").await, "original");
}

#[tokio::test]
async fn empty_completion_falls_back_to_original() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let rewriter = ChatRewriter::new(settings(&server), Duration::from_secs(5)).unwrap();
    assert_eq!(
        rewriter.try_rewrite("original").await,
        Err(RewriteError::EmptyResponse)
    );
    assert_eq!(rewriter.rewrite("original").await, "original");
}

#[tokio::test]
async fn missing_api_key_never_calls_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let rewriter = ChatRewriter::new(
        RewriteSettings {
            api_key: None,
            ..settings(&server)
        },
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(
        rewriter.try_rewrite("original").await,
        Err(RewriteError::MissingApiKey)
    );
    assert_eq!(rewriter.rewrite("original").await, "original");
}
