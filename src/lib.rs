//! # DeepSearch - multi-agent deep research assistant
//!
//! A research chat built from cooperating LLM agents. Every user turn enters
//! at a coordinator, which answers directly or hands the conversation to the
//! agents that refine the request, plan the research and produce a cited
//! report.
//!
//! ## Agent graph
//!
//! ```text
//! Coordinator ──► Requirement Gathering ──► Planning ──► Lead
//!      └──────────────────────────────────────────────────┘
//!                                   Lead ──tool──► Citation, Reflection
//! ```
//!
//! Handoffs transfer control for the rest of the turn. Citation and reflection
//! are invoked as tools: they run to completion in their own loop and return
//! their text to the lead agent.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deepsearch::{AgentGraph, DeepSearchConfig, OpenAIFactory, Runner, RunnerConfig};
//! use deepsearch::tools::{default_registry, Mem0Client, TavilyClient};
//! use std::sync::Arc;
//!
//! let config = DeepSearchConfig::load_or_default("deepsearch.toml")?;
//! let tools = Arc::new(default_registry(
//!     Arc::new(TavilyClient::new(tavily_key, &config.search.base_url)?),
//!     Arc::new(Mem0Client::new(mem0_key, &config.memory.base_url)?),
//!     config.memory.top_k,
//! ));
//! let graph = Arc::new(AgentGraph::canonical(&config));
//! graph.validate(&tools)?;
//!
//! let factory = OpenAIFactory::from_config(&config.provider)?;
//! let runner = Runner::new(graph, tools, &factory, RunnerConfig::default())?;
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent definitions, instructions and the agent graph
//! - [`runner`] - The turn-budgeted run loop and lifecycle hooks
//! - [`llm`] - Chat-completions client with tool calling
//! - [`tools`] - Web search, user memory and profile tools
//! - [`session`] - Conversation history stores
//! - [`chat`] - One reply per user input, shared by CLI and HTTP
//! - [`api`] - REST API handlers and routes
//! - [`types`] - Common types and error handling

/// Agent definitions and the handoff graph.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Chat service shared by the CLI and the HTTP API.
pub mod chat;
/// Command-line interface.
pub mod cli;
/// LLM client abstractions and the OpenAI-compatible client.
pub mod llm;
/// Run loop, turn budget and lifecycle hooks.
pub mod runner;
/// Conversation history stores.
pub mod session;
/// Built-in tools (web search, user memory, profile).
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{AgentDefinition, AgentGraph, AgentId};
pub use chat::{ChatReply, ChatService};
pub use llm::{LLMClient, LLMClientFactory, LLMResponse, OpenAIFactory};
pub use runner::{RunHooks, RunResult, Runner, RunnerConfig};
pub use session::{InMemorySessionStore, SessionStore, SqliteSessionStore};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::DeepSearchConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat service bound to the configured session
    pub chat: Arc<ChatService>,
}
