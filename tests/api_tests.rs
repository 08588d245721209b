//! HTTP surface over the chat service.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::mocks::handoff;
use common::Harness;
use deepsearch::api::routes::create_app;
use deepsearch::chat::SESSION_CLEARED_MESSAGE;
use deepsearch::types::{ChatResponse, ReplyStatus};
use deepsearch::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

fn create_test_server(harness: &Harness) -> TestServer {
    let state = AppState {
        chat: Arc::new(harness.chat()),
    };
    TestServer::new(create_app(state)).expect("Failed to create test server")
}

#[tokio::test]
async fn test_health_check() {
    let harness = Harness::new();
    let server = create_test_server(&harness);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_chat_returns_final_output() {
    let harness = Harness::new();
    harness
        .model
        .push_calls(vec![handoff("h1", "lead")])
        .push_text("A cited report.");
    let server = create_test_server(&harness);

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "research wasm runtimes"}))
        .await;

    response.assert_status_ok();
    let body: ChatResponse = response.json();
    assert_eq!(body.response, "A cited report.");
    assert_eq!(body.status, ReplyStatus::Completed);
}

#[tokio::test]
async fn test_chat_failure_is_a_reply() {
    let harness = Harness::new();
    harness.model.push_error("rate limited");
    let server = create_test_server(&harness);

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hello"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["response"], "Error:LLM error: rate limited");
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let harness = Harness::new();
    let server = create_test_server(&harness);

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "   "}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("message"));
    assert!(harness.model.calls().is_empty());
}

#[tokio::test]
async fn test_chat_clear_command() {
    let harness = Harness::new();
    let server = create_test_server(&harness);

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "delete session history"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["status"], "session_cleared");
    assert_eq!(body["response"], SESSION_CLEARED_MESSAGE);
}

#[tokio::test]
async fn test_delete_session() {
    let harness = Harness::new();
    let server = create_test_server(&harness);

    let response = server.delete("/api/session").await;

    response.assert_status_ok();
    let body: ChatResponse = response.json();
    assert_eq!(body.status, ReplyStatus::SessionCleared);
}

#[tokio::test]
async fn test_agents_list() {
    let harness = Harness::new();
    let server = create_test_server(&harness);

    let response = server.get("/api/agents").await;

    response.assert_status_ok();
    let agents: Vec<Value> = response.json();
    assert_eq!(agents.len(), 6);

    let coordinator = agents
        .iter()
        .find(|a| a["id"] == "coordinator")
        .expect("coordinator listed");
    assert_eq!(coordinator["name"], "DeepSearch Agent");
    assert_eq!(
        coordinator["handoffs"],
        json!(["requirement_gathering", "lead"])
    );

    let lead = agents.iter().find(|a| a["id"] == "lead").unwrap();
    assert_eq!(lead["model"], "gemini-2.5-pro");
    assert_eq!(
        lead["sub_agents"],
        json!(["citation_tool", "reflect_data_tool"])
    );
    assert_eq!(lead["handoffs"], json!([]));
}
