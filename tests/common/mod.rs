#![allow(dead_code)]

pub mod mocks;

use deepsearch::tools::default_registry;
use deepsearch::types::{RunContext, UserProfile};
use deepsearch::{AgentGraph, ChatService, DeepSearchConfig, InMemorySessionStore, Runner, RunnerConfig};
use mocks::{ScriptedModel, StaticMemory, StaticSearch};
use std::sync::Arc;

pub struct Harness {
    pub model: ScriptedModel,
    pub search: Arc<StaticSearch>,
    pub memory: Arc<StaticMemory>,
    pub runner: Arc<Runner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// The research graph over scripted model output and static providers
    pub fn with_config(config: RunnerConfig) -> Self {
        let model = ScriptedModel::new();
        let search = Arc::new(StaticSearch::with_result(
            "Rust 2024",
            "The 2024 edition shipped with Rust 1.85.",
            "https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html",
        ));
        let memory = Arc::new(StaticMemory::default());

        let tools = Arc::new(default_registry(search.clone(), memory.clone(), 10));
        let graph = AgentGraph::canonical(&DeepSearchConfig::default());
        graph.validate(&tools).expect("canonical graph is valid");

        let runner = Runner::new(Arc::new(graph), tools, &model, config).expect("runner");
        Self {
            model,
            search,
            memory,
            runner: Arc::new(runner),
        }
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(
            self.runner.clone(),
            Arc::new(InMemorySessionStore::new()),
            "test-session",
            profile(),
            "Deep Research Session",
        )
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        name: "Ada Lovelace".to_string(),
        interests: vec!["compilers".to_string(), "history".to_string()],
    }
}

pub fn ctx() -> RunContext {
    RunContext::new(profile(), "Deep Research Session")
}
