//! Lifecycle callbacks fired by the runner
//!
//! A fresh hooks value is created for every run and passed by `&mut` through
//! it, so counters never leak between user turns.

use crate::agents::AgentDefinition;
use crate::llm::LLMResponse;
use crate::types::RunContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub trait RunHooks: Send {
    fn on_agent_start(&mut self, _ctx: &RunContext, _agent: &AgentDefinition) {}

    fn on_llm_start(&mut self, _ctx: &RunContext, _agent: &AgentDefinition) {}

    fn on_llm_end(&mut self, _ctx: &RunContext, _agent: &AgentDefinition, _response: &LLMResponse) {}

    fn on_tool_start(&mut self, _ctx: &RunContext, _agent: &AgentDefinition, _tool: &str) {}

    fn on_tool_end(
        &mut self,
        _ctx: &RunContext,
        _agent: &AgentDefinition,
        _tool: &str,
        _result: &str,
    ) {
    }

    fn on_handoff(&mut self, _ctx: &RunContext, _from: &AgentDefinition, _to: &AgentDefinition) {}

    fn on_agent_end(&mut self, _ctx: &RunContext, _agent: &AgentDefinition, _output: &str) {}

    /// Counters collected so far, if this implementation keeps any
    fn snapshot(&self) -> Option<RunStats> {
        None
    }
}

/// Hooks that do nothing
#[derive(Debug, Default)]
pub struct NoopHooks;

impl RunHooks for NoopHooks {}

/// Diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub active_agents: Vec<String>,
    pub handoffs: usize,
    pub tool_usage: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn summary(&self) -> String {
        format!(
            "{} agents used, {} handoffs",
            self.active_agents.len(),
            self.handoffs
        )
    }
}

/// Records agent activity, handoffs and per-tool usage, logging each event
#[derive(Debug, Default)]
pub struct TelemetryHooks {
    stats: RunStats,
}

impl TelemetryHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

impl RunHooks for TelemetryHooks {
    fn on_agent_start(&mut self, ctx: &RunContext, agent: &AgentDefinition) {
        self.stats.active_agents.push(agent.name.clone());
        info!(
            run_id = %ctx.run_id,
            agent = %agent.name,
            active_agents = ?self.stats.active_agents,
            "Agent is now working"
        );
    }

    fn on_llm_start(&mut self, ctx: &RunContext, agent: &AgentDefinition) {
        debug!(run_id = %ctx.run_id, agent = %agent.name, model = %agent.model, "Agent is thinking");
    }

    fn on_llm_end(&mut self, ctx: &RunContext, agent: &AgentDefinition, response: &LLMResponse) {
        debug!(
            run_id = %ctx.run_id,
            agent = %agent.name,
            tool_calls = response.tool_calls.len(),
            finish_reason = %response.finish_reason,
            "Agent finished thinking"
        );
    }

    fn on_tool_start(&mut self, ctx: &RunContext, agent: &AgentDefinition, tool: &str) {
        let count = self.stats.tool_usage.entry(tool.to_string()).or_insert(0);
        *count += 1;
        info!(run_id = %ctx.run_id, agent = %agent.name, tool, uses = *count, "Tool invoked");
    }

    fn on_tool_end(&mut self, ctx: &RunContext, agent: &AgentDefinition, tool: &str, result: &str) {
        debug!(
            run_id = %ctx.run_id,
            agent = %agent.name,
            tool,
            result_len = result.len(),
            "Tool finished"
        );
    }

    fn on_handoff(&mut self, ctx: &RunContext, from: &AgentDefinition, to: &AgentDefinition) {
        self.stats.handoffs += 1;
        info!(
            run_id = %ctx.run_id,
            handoff = self.stats.handoffs,
            from = %from.name,
            to = %to.name,
            "Handoff"
        );
    }

    fn on_agent_end(&mut self, ctx: &RunContext, agent: &AgentDefinition, _output: &str) {
        info!(
            run_id = %ctx.run_id,
            agent = %agent.name,
            "Agent completed; {}",
            self.stats.summary()
        );
    }

    fn snapshot(&self) -> Option<RunStats> {
        Some(self.stats.clone())
    }
}
