//! Agent definitions and the handoff topology
//!
//! An agent is plain data: a name, an instruction builder, a model, the tools
//! it may call and the sub-agents it may call as tools. Which agent may hand
//! control to which is kept out of the definitions, in the adjacency table of
//! [`AgentGraph`].

pub mod instructions;
pub mod registry;

use crate::llm::ModelSettings;
use crate::types::RunContext;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use registry::AgentGraph;

/// Identity of every agent in the research workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Coordinator,
    RequirementGathering,
    Planning,
    Lead,
    Citation,
    Reflection,
}

impl AgentId {
    pub const ALL: [AgentId; 6] = [
        AgentId::Coordinator,
        AgentId::RequirementGathering,
        AgentId::Planning,
        AgentId::Lead,
        AgentId::Citation,
        AgentId::Reflection,
    ];

    /// Key used in configuration and in handoff tool names
    pub fn key(&self) -> &'static str {
        match self {
            AgentId::Coordinator => "coordinator",
            AgentId::RequirementGathering => "requirement_gathering",
            AgentId::Planning => "planning",
            AgentId::Lead => "lead",
            AgentId::Citation => "citation",
            AgentId::Reflection => "reflection",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// Name of the tool that hands control to this agent
    pub fn handoff_tool_name(&self) -> String {
        format!("transfer_to_{}", self.key())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Builds an agent's system prompt for one run
pub type InstructionBuilder = fn(&RunContext, &AgentDefinition) -> String;

/// A sub-agent exposed to its caller as an ordinary tool
///
/// The call returns control to the caller with the sub-agent's final text;
/// it never transfers the run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentToolBinding {
    pub tool_name: String,
    pub description: String,
    pub target: AgentId,
}

impl AgentToolBinding {
    pub fn new(tool_name: impl Into<String>, description: impl Into<String>, target: AgentId) -> Self {
        Self {
            tool_name: tool_name.into(),
            description: description.into(),
            target,
        }
    }

    pub fn parameters_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The draft or excerpt to review"
                }
            },
            "required": ["input"]
        })
    }
}

/// Immutable description of one agent
#[derive(Clone)]
pub struct AgentDefinition {
    pub id: AgentId,
    pub name: String,
    pub instructions: InstructionBuilder,
    pub model: String,
    /// Registry tools this agent may call
    pub tools: Vec<String>,
    pub sub_agents: Vec<AgentToolBinding>,
    /// Shown to agents that can hand off to this one
    pub handoff_description: String,
    pub settings: ModelSettings,
}

impl AgentDefinition {
    pub fn new(id: AgentId, name: impl Into<String>, instructions: InstructionBuilder) -> Self {
        Self {
            id,
            name: name.into(),
            instructions,
            model: String::new(),
            tools: Vec::new(),
            sub_agents: Vec::new(),
            handoff_description: String::new(),
            settings: ModelSettings::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_sub_agent(mut self, binding: AgentToolBinding) -> Self {
        self.sub_agents.push(binding);
        self
    }

    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = description.into();
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Render the system prompt for this run
    pub fn instructions(&self, ctx: &RunContext) -> String {
        (self.instructions)(ctx, self)
    }

    pub fn permits_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    pub fn sub_agent(&self, tool_name: &str) -> Option<&AgentToolBinding> {
        self.sub_agents.iter().find(|b| b.tool_name == tool_name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(String::as_str).collect()
    }
}

impl fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("sub_agents", &self.sub_agents)
            .field("settings", &self.settings)
            .finish()
    }
}
