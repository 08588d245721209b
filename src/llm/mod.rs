//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for talking to a chat-completions
//! model. The rest of the application only sees the [`LLMClient`] trait and
//! asks an [`LLMClientFactory`] for one client per agent model.
//!
//! # Example
//!
//! ```ignore
//! use deepsearch::llm::{LLMClientFactory, OpenAIFactory};
//!
//! let factory = OpenAIFactory::from_config(&config.provider)?;
//! let client = factory.create_client("gemini-2.5-flash")?;
//! let response = client
//!     .generate_with_tools_and_history(&messages, &tools, &settings)
//!     .await?;
//! ```

/// Core LLM client trait and conversation types.
pub mod client;
/// OpenAI-compatible HTTP client.
pub mod openai;

pub use client::{
    ConversationMessage, ConversationRole, LLMClient, LLMClientFactory, LLMResponse,
    ModelSettings, TokenUsage, ToolChoice,
};
pub use openai::{OpenAIClient, OpenAIFactory};
