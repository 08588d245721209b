//! Agent graph: definitions plus the handoff adjacency table
//!
//! The graph is built once at startup, validated, and then shared read-only
//! by every run.
//!
//! ## Canonical topology
//!
//! ```text
//! coordinator ──► requirement_gathering ──► planning ──► lead
//!      └───────────────────────────────────────────────►─┘
//! lead ──(tool)──► citation
//! lead ──(tool)──► reflection
//! ```

use super::{instructions, AgentDefinition, AgentId, AgentToolBinding};
use crate::llm::ModelSettings;
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result, ToolDefinition};
use crate::utils::toml_config::{ConfigError, DeepSearchConfig};
use std::collections::{BTreeMap, HashSet};

const LEAD_MODEL: &str = "gemini-2.5-pro";

pub struct AgentGraph {
    agents: BTreeMap<AgentId, AgentDefinition>,
    handoffs: BTreeMap<AgentId, Vec<AgentId>>,
    entry: AgentId,
}

impl AgentGraph {
    pub fn new(entry: AgentId) -> Self {
        Self {
            agents: BTreeMap::new(),
            handoffs: BTreeMap::new(),
            entry,
        }
    }

    /// The research workflow, with model and temperature overrides from config
    pub fn canonical(config: &DeepSearchConfig) -> Self {
        let default_model = config.provider.default_model.as_str();

        let agents = [
            AgentDefinition::new(
                AgentId::Coordinator,
                "DeepSearch Agent",
                instructions::coordinator,
            )
            .with_model(default_model)
            .with_tools(&["search_user_memory", "save_user_memory"])
            .with_settings(ModelSettings::with_temperature(0.7)),
            AgentDefinition::new(
                AgentId::RequirementGathering,
                "Requirement Gathering Agent",
                instructions::requirement_gathering,
            )
            .with_model(default_model)
            .with_tools(&["web_search", "get_info", "save_user_memory", "search_user_memory"])
            .with_handoff_description("Clarifies the user's research requirements before planning")
            .with_settings(ModelSettings::with_temperature(0.7)),
            AgentDefinition::new(AgentId::Planning, "Planning Agent", instructions::planning)
                .with_model(default_model)
                .with_tools(&["web_search", "save_user_memory", "search_user_memory"])
                .with_handoff_description("Turns clear requirements into a step-by-step research plan")
                .with_settings(ModelSettings::with_temperature(0.8)),
            AgentDefinition::new(AgentId::Lead, "Lead Agent", instructions::lead)
                .with_model(LEAD_MODEL)
                .with_tools(&["web_search", "get_info", "save_user_memory", "search_user_memory"])
                .with_sub_agent(AgentToolBinding::new(
                    "citation_tool",
                    "It Checks the Citation for final response",
                    AgentId::Citation,
                ))
                .with_sub_agent(AgentToolBinding::new(
                    "reflect_data_tool",
                    "It reflects the final response of the Agent.",
                    AgentId::Reflection,
                ))
                .with_handoff_description("Executes research and writes the final cited answer")
                .with_settings(ModelSettings::with_temperature(1.9)),
            AgentDefinition::new(AgentId::Citation, "Citation Agent", instructions::citation)
                .with_model(default_model)
                .with_tools(&["web_search"])
                .with_handoff_description("Checking for best Citation"),
            AgentDefinition::new(AgentId::Reflection, "Reflect Agent", instructions::reflection)
                .with_model(default_model)
                .with_tools(&["web_search"])
                .with_handoff_description("Reflect Agent that Reflects the data"),
        ];

        let mut graph = Self::new(AgentId::Coordinator);
        for mut agent in agents {
            if let Some(over) = config.agent_override(agent.id.key()) {
                if let Some(model) = &over.model {
                    agent.model = model.clone();
                }
                if let Some(temperature) = over.temperature {
                    agent.settings.temperature = Some(temperature);
                }
            }
            graph.add_agent(agent);
        }

        graph.add_handoff(AgentId::Coordinator, AgentId::RequirementGathering);
        graph.add_handoff(AgentId::Coordinator, AgentId::Lead);
        graph.add_handoff(AgentId::RequirementGathering, AgentId::Planning);
        graph.add_handoff(AgentId::Planning, AgentId::Lead);
        graph
    }

    pub fn add_agent(&mut self, agent: AgentDefinition) {
        self.agents.insert(agent.id, agent);
    }

    pub fn add_handoff(&mut self, from: AgentId, to: AgentId) {
        let targets = self.handoffs.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    pub fn entry(&self) -> AgentId {
        self.entry
    }

    pub fn agent(&self, id: AgentId) -> Result<&AgentDefinition> {
        self.agents
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Agent not defined: {}", id)))
    }

    /// Agents in declaration order
    pub fn agents(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    pub fn handoff_targets(&self, id: AgentId) -> &[AgentId] {
        self.handoffs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a tool name issued by `from` to a permitted handoff target
    pub fn resolve_handoff(&self, from: AgentId, tool_name: &str) -> Option<AgentId> {
        self.handoff_targets(from)
            .iter()
            .copied()
            .find(|target| target.handoff_tool_name() == tool_name)
    }

    /// Tool definitions presenting each handoff target of `from`
    pub fn handoff_tools(&self, from: AgentId) -> Vec<ToolDefinition> {
        self.handoff_targets(from)
            .iter()
            .filter_map(|target| self.agents.get(target))
            .map(|agent| ToolDefinition {
                name: agent.id.handoff_tool_name(),
                description: format!(
                    "Handoff to the {} to handle the request. {}",
                    agent.name, agent.handoff_description
                )
                .trim_end()
                .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            })
            .collect()
    }

    /// Everything `id` may call: registry tools, sub-agents, then handoffs
    pub fn tool_definitions(&self, id: AgentId, tools: &ToolRegistry) -> Result<Vec<ToolDefinition>> {
        let agent = self.agent(id)?;
        let mut definitions = tools.get_tool_definitions_for(&agent.tool_names());
        definitions.extend(agent.sub_agents.iter().map(|binding| ToolDefinition {
            name: binding.tool_name.clone(),
            description: binding.description.clone(),
            parameters: AgentToolBinding::parameters_schema(),
        }));
        definitions.extend(self.handoff_tools(id));
        Ok(definitions)
    }

    /// Check references, tool availability, acyclicity and reachability
    pub fn validate(&self, tools: &ToolRegistry) -> std::result::Result<(), ConfigError> {
        if !self.agents.contains_key(&self.entry) {
            return Err(ConfigError::ValidationError(format!(
                "Entry agent '{}' is not defined",
                self.entry
            )));
        }

        for (from, targets) in &self.handoffs {
            if !self.agents.contains_key(from) {
                return Err(ConfigError::ValidationError(format!(
                    "Handoff source '{}' is not defined",
                    from
                )));
            }
            for target in targets {
                if !self.agents.contains_key(target) {
                    return Err(ConfigError::MissingAgent(
                        target.to_string(),
                        from.to_string(),
                    ));
                }
            }
        }

        for agent in self.agents.values() {
            for tool in &agent.tools {
                if !tools.has_tool(tool) {
                    return Err(ConfigError::ValidationError(format!(
                        "Agent '{}' references unknown tool '{}'",
                        agent.id, tool
                    )));
                }
            }
            for binding in &agent.sub_agents {
                let Some(target) = self.agents.get(&binding.target) else {
                    return Err(ConfigError::MissingAgent(
                        binding.target.to_string(),
                        agent.id.to_string(),
                    ));
                };
                if !self.handoff_targets(target.id).is_empty() || !target.sub_agents.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "Sub-agent '{}' must not hand off or call other agents",
                        target.id
                    )));
                }
                if tools.has_tool(&binding.tool_name) {
                    return Err(ConfigError::ValidationError(format!(
                        "Sub-agent tool '{}' shadows a registered tool",
                        binding.tool_name
                    )));
                }
            }
        }

        self.detect_cycles()?;

        let reachable = self.reachable_from(self.entry);
        for id in self.agents.keys() {
            if !reachable.contains(id) {
                return Err(ConfigError::UnreachableAgent(id.to_string()));
            }
        }

        Ok(())
    }

    fn edges(&self, id: AgentId) -> Vec<AgentId> {
        let mut next: Vec<AgentId> = self.handoff_targets(id).to_vec();
        if let Some(agent) = self.agents.get(&id) {
            next.extend(agent.sub_agents.iter().map(|b| b.target));
        }
        next
    }

    fn reachable_from(&self, start: AgentId) -> HashSet<AgentId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.edges(id));
            }
        }
        seen
    }

    fn detect_cycles(&self) -> std::result::Result<(), ConfigError> {
        fn visit(
            graph: &AgentGraph,
            id: AgentId,
            path: &mut Vec<AgentId>,
            done: &mut HashSet<AgentId>,
        ) -> std::result::Result<(), ConfigError> {
            if done.contains(&id) {
                return Ok(());
            }
            if let Some(pos) = path.iter().position(|p| *p == id) {
                let cycle: Vec<&str> = path[pos..]
                    .iter()
                    .chain(std::iter::once(&id))
                    .map(AgentId::key)
                    .collect();
                return Err(ConfigError::CircularReference(cycle.join(" -> ")));
            }
            path.push(id);
            for next in graph.edges(id) {
                visit(graph, next, path, done)?;
            }
            path.pop();
            done.insert(id);
            Ok(())
        }

        let mut done = HashSet::new();
        for id in self.agents.keys() {
            visit(self, *id, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }
}
