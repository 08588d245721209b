//! OpenAI-compatible chat-completions client over reqwest
//!
//! Gemini, OpenAI and most hosted providers expose the same
//! `POST {api_base}/chat/completions` surface, so one client covers them.

use crate::llm::client::{
    ConversationMessage, ConversationRole, LLMClient, LLMClientFactory, LLMResponse,
    ModelSettings, TokenUsage,
};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::{ConfigError, ProviderConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAIClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Base delay of the exponential backoff between retries
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
        settings: &ModelSettings,
    ) -> Value {
        let messages: Vec<Value> = messages.iter().map(message_to_json).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            let tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!(settings.tool_choice.as_str());
        }

        if let Some(temperature) = settings.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    /// POST the request, retrying connection failures, timeouts, 429 and 5xx
    async fn send_with_retry(&self, body: &Value) -> Result<ChatCompletionResponse> {
        let url = self.endpoint();
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.max_retries => {
                    warn!(model = %self.model, attempt, "Provider request failed: {}", e);
                    self.backoff(attempt).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(AppError::LLM(format!("HTTP request failed: {}", e))),
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<ChatCompletionResponse>()
                    .await
                    .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)));
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if retryable && attempt < self.max_retries {
                warn!(model = %self.model, attempt, %status, "Provider returned retryable status");
                self.backoff(attempt).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Provider request failed ({}): {}",
                status, text
            )));
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.retry_delay.saturating_mul(2u32.saturating_pow(attempt));
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
        settings: &ModelSettings,
    ) -> Result<LLMResponse> {
        let body = self.build_request(messages, tools, settings);
        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "Sending chat completion");

        let response = self.send_with_retry(&body).await?;
        parse_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn message_to_json(message: &ConversationMessage) -> Value {
    match message.role {
        ConversationRole::System => json!({"role": "system", "content": message.content}),
        ConversationRole::User => json!({"role": "user", "content": message.content}),
        ConversationRole::Assistant if message.tool_calls.is_empty() => {
            json!({"role": "assistant", "content": message.content})
        }
        ConversationRole::Assistant => {
            let tool_calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string()
                        }
                    })
                })
                .collect();
            let content = if message.content.is_empty() {
                Value::Null
            } else {
                json!(message.content)
            };
            json!({"role": "assistant", "content": content, "tool_calls": tool_calls})
        }
        ConversationRole::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content
        }),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn parse_response(response: ChatCompletionResponse) -> Result<LLMResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::LLM("No choices in provider response".to_string()))?;

    let mut tool_calls = Vec::with_capacity(choice.message.tool_calls.len());
    for call in choice.message.tool_calls {
        let arguments = if call.function.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                AppError::LLM(format!(
                    "Invalid arguments for tool '{}': {}",
                    call.function.name, e
                ))
            })?
        };
        let id = if call.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            call.id
        };
        tool_calls.push(ToolCall {
            id,
            name: call.function.name,
            arguments,
        });
    }

    let finish_reason = choice.finish_reason.unwrap_or_else(|| {
        if tool_calls.is_empty() {
            "stop".to_string()
        } else {
            "tool_calls".to_string()
        }
    });

    Ok(LLMResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason,
        usage: response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
    })
}

/// Builds [`OpenAIClient`]s that share one provider configuration
#[derive(Clone)]
pub struct OpenAIFactory {
    api_key: String,
    api_base: String,
    timeout: Duration,
    max_retries: u32,
}

impl OpenAIFactory {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: api_base.into(),
            timeout,
            max_retries,
        }
    }

    /// Resolve the API key from the environment variable named in the config
    pub fn from_config(config: &ProviderConfig) -> std::result::Result<Self, ConfigError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ConfigError::MissingEnvVar(config.api_key_env.clone()))?;
        Ok(Self::new(
            api_key,
            config.api_base.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        ))
    }
}

impl LLMClientFactory for OpenAIFactory {
    fn create_client(&self, model: &str) -> Result<Arc<dyn LLMClient>> {
        let client = OpenAIClient::new(
            self.api_key.clone(),
            self.api_base.clone(),
            model,
            self.timeout,
            self.max_retries,
        )?;
        Ok(Arc::new(client))
    }
}
