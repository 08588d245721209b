use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub status: ReplyStatus,
}

/// Which of the user-visible outcomes a chat turn produced.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Completed,
    SessionCleared,
    TurnsExceeded,
    Failed,
}

// ============= Run Context =============

/// Profile of the user a run is performed for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Read-only value shared by every instruction builder and tool during one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub workflow_name: String,
    pub profile: UserProfile,
}

impl RunContext {
    pub fn new(profile: UserProfile, workflow_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            workflow_name: workflow_name.into(),
            profile,
        }
    }
}

// ============= Session Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(role: &str) -> Self {
        match role {
            "system" => MessageRole::System,
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Max turns ({0}) exceeded")]
    MaxTurnsExceeded(usize),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::MaxTurnsExceeded(max) => (
                axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                format!("Max turns ({}) exceeded", max),
            ),
            AppError::LLM(msg) | AppError::Search(msg) | AppError::Memory(msg) => {
                (axum::http::StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Configuration(msg)
            | AppError::Database(msg)
            | AppError::Tool(msg)
            | AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_round_trip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::parse(role.as_str()), role);
        }
        assert_eq!(MessageRole::parse("tool"), MessageRole::User);
    }

    #[test]
    fn test_run_context_has_unique_id() {
        let profile = UserProfile {
            name: "nafay".to_string(),
            interests: vec!["AI".to_string()],
        };
        let a = RunContext::new(profile.clone(), "Deep Research Session");
        let b = RunContext::new(profile, "Deep Research Session");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.workflow_name, "Deep Research Session");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AppError::MaxTurnsExceeded(50).to_string(),
            "Max turns (50) exceeded"
        );
        assert_eq!(
            AppError::Search("401 Unauthorized".to_string()).to_string(),
            "Search error: 401 Unauthorized"
        );
    }

    #[test]
    fn test_reply_status_serialization() {
        let json = serde_json::to_string(&ReplyStatus::TurnsExceeded).unwrap();
        assert_eq!(json, "\"turns_exceeded\"");
    }
}
