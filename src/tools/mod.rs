//! Built-in Tools for Agent Capabilities
//!
//! Tools are the actions an agent can take without giving up control:
//! searching the web, reading and writing the user's memories, and reading the
//! profile carried by the run context.
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - `web_search` over the Tavily API
//! - [`memory`](crate::tools::memory) - `search_user_memory` / `save_user_memory` over mem0
//! - [`profile`](crate::tools::profile) - `get_info`
//! - [`registry`](crate::tools::registry) - Tool registration and dispatch
//!
//! Handoffs and sub-agent calls are also presented to the model as tools, but
//! they are resolved by the runner and never live in the registry.

/// User memory tools and the mem0 client.
pub mod memory;
/// Run-context profile tool.
pub mod profile;
/// Tool registry for managing available tools.
pub mod registry;
/// Web search tool and the Tavily client.
pub mod search;

use std::sync::Arc;

pub use memory::{sanitize_user_id, Mem0Client, MemoryProvider, MemoryRecord};
pub use registry::{Tool, ToolRegistry};
pub use search::{format_search_results, SearchProvider, SearchResult, TavilyClient};

/// Registry holding every tool an agent can be granted
pub fn default_registry(
    search: Arc<dyn SearchProvider>,
    memory: Arc<dyn MemoryProvider>,
    memory_top_k: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(search::WebSearchTool::new(search)));
    registry.register(Arc::new(memory::SearchUserMemoryTool::new(
        memory.clone(),
        memory_top_k,
    )));
    registry.register(Arc::new(memory::SaveUserMemoryTool::new(memory)));
    registry.register(Arc::new(profile::GetInfoTool));
    registry
}
