//! Chat service: clear commands, reply shapes and session persistence.

mod common;

use common::mocks::call;
use common::{profile, Harness};
use deepsearch::chat::{MAX_TURNS_MESSAGE, SESSION_CLEARED_MESSAGE, WELCOME_MESSAGE};
use deepsearch::types::{Message, MessageRole, ReplyStatus};
use deepsearch::{ChatService, InMemorySessionStore, RunnerConfig, SessionStore};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

fn chat_with_store(harness: &Harness) -> (ChatService, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let chat = ChatService::new(
        harness.runner.clone(),
        store.clone(),
        "s1",
        profile(),
        "Deep Research Session",
    );
    (chat, store)
}

#[test]
fn test_welcome_message() {
    let harness = Harness::new();
    assert_eq!(harness.chat().welcome(), WELCOME_MESSAGE);
    assert!(WELCOME_MESSAGE.starts_with("Hello! I am DeepSearch Agent"));
}

#[rstest]
#[case("remove session")]
#[case("delete session")]
#[case("remove session history")]
#[case("delete session history")]
#[case("  Delete Session  ")]
#[case("REMOVE SESSION HISTORY")]
#[tokio::test]
async fn test_clear_commands_empty_history(#[case] input: &str) {
    let harness = Harness::new();
    let (chat, store) = chat_with_store(&harness);
    store
        .add_messages("s1", &[Message::new(MessageRole::User, "old")])
        .await
        .unwrap();

    let reply = chat.handle(input).await;

    assert_eq!(reply.status, ReplyStatus::SessionCleared);
    assert_eq!(reply.text, SESSION_CLEARED_MESSAGE);
    assert!(store.get_messages("s1").await.unwrap().is_empty());
    // No model call is made for a clear command
    assert!(harness.model.calls().is_empty());
}

#[rstest]
#[case("delete the session")]
#[case("please delete session")]
#[case("session")]
#[tokio::test]
async fn test_near_miss_commands_start_a_run(#[case] input: &str) {
    let harness = Harness::new();
    harness.model.push_text("Which session do you mean?");
    let chat = harness.chat();

    let reply = chat.handle(input).await;

    assert_eq!(reply.status, ReplyStatus::Completed);
    assert_eq!(harness.model.calls().len(), 1);
}

#[tokio::test]
async fn test_completed_turn_is_appended_to_session() {
    let harness = Harness::new();
    harness.model.push_text("first answer").push_text("second answer");
    let (chat, store) = chat_with_store(&harness);

    chat.handle("first question").await;
    let reply = chat.handle("second question").await;

    assert_eq!(reply.text, "second answer");
    assert!(reply.stats.is_some());

    let history = store.get_messages("s1").await.unwrap();
    let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["first question", "first answer", "second question", "second answer"]
    );

    // system prompt, the first exchange, the new question
    let second_call = &harness.model.calls()[1];
    assert_eq!(second_call.messages.len(), 4);
    assert_eq!(second_call.messages[1].content, "first question");
}

#[tokio::test]
async fn test_turn_limit_reply() {
    let harness = Harness::with_config(RunnerConfig {
        max_turns: 3,
        sub_agent_max_turns: 10,
    });
    harness.model.push_repeated_calls(
        call("m", "search_user_memory", json!({"query": "anything"})),
        5,
    );
    let (chat, store) = chat_with_store(&harness);

    let reply = chat.handle("research everything").await;

    assert_eq!(reply.status, ReplyStatus::TurnsExceeded);
    assert_eq!(reply.text, MAX_TURNS_MESSAGE);
    assert!(store.get_messages("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_reply_shape() {
    let harness = Harness::new();
    harness.model.push_error("quota exhausted");
    let (chat, store) = chat_with_store(&harness);

    let reply = chat.handle("hello").await;

    assert_eq!(reply.status, ReplyStatus::Failed);
    assert_eq!(reply.text, "Error:LLM error: quota exhausted");
    assert!(store.get_messages("s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_without_input() {
    let harness = Harness::new();
    harness.model.push_text("answer");
    let (chat, store) = chat_with_store(&harness);
    chat.handle("question").await;
    assert_eq!(store.get_messages("s1").await.unwrap().len(), 2);

    let reply = chat.clear().await;

    assert_eq!(reply.status, ReplyStatus::SessionCleared);
    assert!(store.get_messages("s1").await.unwrap().is_empty());
}
