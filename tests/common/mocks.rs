//! Mock implementations for testing.
//!
//! The scripted model client pops one response per call from a queue shared by
//! every client the factory hands out, so a test scripts a whole run (across
//! handoffs and sub-agents) in call order.

use async_trait::async_trait;
use deepsearch::llm::{ConversationMessage, LLMClient, LLMClientFactory, LLMResponse, ModelSettings};
use deepsearch::tools::{MemoryProvider, MemoryRecord, SearchProvider, SearchResult};
use deepsearch::types::{AppError, Result, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;

/// One recorded model call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<String>,
    pub temperature: Option<f32>,
}

impl RecordedCall {
    pub fn system_prompt(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn offers(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<LLMResponse>>,
    calls: Vec<RecordedCall>,
}

/// Response queue shared by all scripted clients
#[derive(Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: LLMResponse) -> &Self {
        self.script.lock().responses.push_back(Ok(response));
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push(LLMResponse::text(text))
    }

    pub fn push_calls(&self, calls: Vec<ToolCall>) -> &Self {
        self.push(LLMResponse::with_tool_calls(calls))
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.script
            .lock()
            .responses
            .push_back(Err(AppError::LLM(message.to_string())));
        self
    }

    /// Keep asking for the same tool forever
    pub fn push_repeated_calls(&self, call: ToolCall, times: usize) -> &Self {
        for i in 0..times {
            self.push_calls(vec![ToolCall {
                id: format!("{}-{}", call.id, i),
                ..call.clone()
            }]);
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().calls.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().responses.len()
    }
}

pub struct ScriptedClient {
    model: String,
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
        settings: &ModelSettings,
    ) -> Result<LLMResponse> {
        let mut script = self.script.lock();
        script.calls.push(RecordedCall {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
            temperature: settings.temperature,
        });
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LLM("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl LLMClientFactory for ScriptedModel {
    fn create_client(&self, model: &str) -> Result<Arc<dyn LLMClient>> {
        Ok(Arc::new(ScriptedClient {
            model: model.to_string(),
            script: self.script.clone(),
        }))
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub fn handoff(id: &str, target_key: &str) -> ToolCall {
    call(id, &format!("transfer_to_{}", target_key), json!({}))
}

/// Search provider returning fixed results and counting queries
#[derive(Default)]
pub struct StaticSearch {
    pub results: Vec<SearchResult>,
    pub queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn with_result(title: &str, content: &str, url: &str) -> Self {
        Self {
            results: vec![SearchResult {
                title: title.to_string(),
                content: content.to_string(),
                url: url.to_string(),
            }],
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.queries.lock().push(query.to_string());
        Ok(self.results.clone())
    }
}

/// In-process memory keyed by user id
#[derive(Default)]
pub struct StaticMemory {
    pub saved: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MemoryProvider for StaticMemory {
    async fn search(&self, _query: &str, user_id: &str, top_k: usize) -> Result<Vec<MemoryRecord>> {
        Ok(self
            .saved
            .lock()
            .iter()
            .filter(|(user, _)| user == user_id)
            .take(top_k)
            .map(|(_, memory)| MemoryRecord {
                id: None,
                memory: memory.clone(),
                score: None,
            })
            .collect())
    }

    async fn add(&self, content: &str, user_id: &str) -> Result<Value> {
        self.saved
            .lock()
            .push((user_id.to_string(), content.to_string()));
        Ok(json!({"status": "ok"}))
    }
}
