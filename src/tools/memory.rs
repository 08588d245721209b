//! User memory tools backed by the mem0 API
//!
//! Memories are scoped by the run context's user name after sanitization, so
//! every agent in a run reads and writes the same memory namespace.

use crate::tools::registry::{required_str, Tool};
use crate::types::{AppError, Result, RunContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_user_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A stored memory fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub memory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// External memory service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// Top-ranked fragments for `user_id`, best first
    async fn search(&self, query: &str, user_id: &str, top_k: usize) -> Result<Vec<MemoryRecord>>;

    /// Store `content` as a user message under `user_id`
    async fn add(&self, content: &str, user_id: &str) -> Result<Value>;
}

pub struct Mem0Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Mem0Client {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Memory(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Memory(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Memory(format!(
                "mem0 request failed ({}): {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Memory(format!("Failed to parse response: {}", e)))
    }
}

/// mem0 answers either with a bare array or with `{"results": [...]}`
fn parse_records(body: Value) -> Result<Vec<MemoryRecord>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| AppError::Memory(format!("Unexpected memory record: {}", e)))
        })
        .collect()
}

#[async_trait]
impl MemoryProvider for Mem0Client {
    async fn search(&self, query: &str, user_id: &str, top_k: usize) -> Result<Vec<MemoryRecord>> {
        let body = json!({
            "query": query,
            "user_id": user_id,
            "top_k": top_k
        });
        let response = self.post("/v1/memories/search/", &body).await?;
        let mut records = parse_records(response)?;
        records.truncate(top_k);
        debug!(user_id, results = records.len(), "Memory search completed");
        Ok(records)
    }

    async fn add(&self, content: &str, user_id: &str) -> Result<Value> {
        let body = json!({
            "messages": [{"role": "user", "content": content}],
            "user_id": user_id
        });
        self.post("/v1/memories/", &body).await
    }
}

/// `search_user_memory` tool
pub struct SearchUserMemoryTool {
    provider: Arc<dyn MemoryProvider>,
    top_k: usize,
}

impl SearchUserMemoryTool {
    pub fn new(provider: Arc<dyn MemoryProvider>, top_k: usize) -> Self {
        Self { provider, top_k }
    }
}

#[async_trait]
impl Tool for SearchUserMemoryTool {
    fn name(&self) -> &str {
        "search_user_memory"
    }

    fn description(&self) -> &str {
        "Use this tool to search user memories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for in the user's memories"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &RunContext, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let user_id = sanitize_user_id(&ctx.profile.name);
        let records = self.provider.search(query, &user_id, self.top_k).await?;
        serde_json::to_value(records).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// `save_user_memory` tool
pub struct SaveUserMemoryTool {
    provider: Arc<dyn MemoryProvider>,
}

impl SaveUserMemoryTool {
    pub fn new(provider: Arc<dyn MemoryProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for SaveUserMemoryTool {
    fn name(&self) -> &str {
        "save_user_memory"
    }

    fn description(&self) -> &str {
        "Use this tool to save user memories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The fact about the user to remember"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &RunContext, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let user_id = sanitize_user_id(&ctx.profile.name);
        self.provider.add(query, &user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserProfile;

    fn ctx(name: &str) -> RunContext {
        RunContext::new(
            UserProfile {
                name: name.to_string(),
                interests: vec![],
            },
            "test",
        )
    }

    #[test]
    fn test_sanitize_user_id() {
        assert_eq!(sanitize_user_id("abdullah! 1"), "abdullah__1");
        assert_eq!(sanitize_user_id("nafay-khan_01"), "nafay-khan_01");
        assert_eq!(sanitize_user_id(""), "");
    }

    #[test]
    fn test_sanitize_preserves_char_length() {
        let raw = "zoë@例.com";
        let clean = sanitize_user_id(raw);
        assert_eq!(clean.chars().count(), raw.chars().count());
        assert_eq!(clean, "zo____com");
        assert!(clean
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_user_id("a b/c?d");
        assert_eq!(sanitize_user_id(&once), once);
    }

    #[test]
    fn test_parse_records_shapes() {
        let bare = json!([{"id": "m1", "memory": "likes rust", "score": 0.9}]);
        assert_eq!(parse_records(bare).unwrap()[0].memory, "likes rust");

        let wrapped = json!({"results": [{"memory": "lives in Karachi"}]});
        let records = parse_records(wrapped).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].id.is_none());

        assert!(parse_records(json!({})).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_uses_sanitized_identity() {
        let mut provider = MockMemoryProvider::new();
        provider
            .expect_search()
            .times(1)
            .returning(|query, user_id, top_k| {
                assert_eq!(query, "favourite language");
                assert_eq!(user_id, "abdullah__1");
                assert_eq!(top_k, 10);
                Ok(vec![MemoryRecord {
                    id: None,
                    memory: "prefers Rust".to_string(),
                    score: Some(0.8),
                }])
            });

        let tool = SearchUserMemoryTool::new(Arc::new(provider), 10);
        let value = tool
            .execute(&ctx("abdullah! 1"), json!({"query": "favourite language"}))
            .await
            .unwrap();
        assert_eq!(value[0]["memory"], "prefers Rust");
    }

    #[tokio::test]
    async fn test_save_uses_sanitized_identity() {
        let mut provider = MockMemoryProvider::new();
        provider.expect_add().times(1).returning(|content, user_id| {
            assert_eq!(content, "works on agent systems");
            assert_eq!(user_id, "nafay_k");
            Ok(json!({"message": "ok"}))
        });

        let tool = SaveUserMemoryTool::new(Arc::new(provider));
        let value = tool
            .execute(&ctx("nafay k"), json!({"query": "works on agent systems"}))
            .await
            .unwrap();
        assert_eq!(value["message"], "ok");
    }
}
