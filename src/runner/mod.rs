//! Run orchestrator
//!
//! Drives one user turn through the agent graph:
//!
//! 1. The active agent is sent its instructions, the transcript so far and the
//!    tools it may call (registry tools, sub-agents, handoffs)
//! 2. Plain tool calls and sub-agent calls are executed in issue order and
//!    their results appended to the transcript
//! 3. The first handoff call, if any, transfers control to its target
//! 4. A reply without tool calls ends the run
//!
//! Every inference, tool call, sub-agent call and honoured handoff consumes
//! one turn of the [`TurnBudget`].

pub mod hooks;
pub mod state;

use crate::agents::{AgentDefinition, AgentGraph, AgentId};
use crate::llm::{ConversationMessage, LLMClient, LLMClientFactory, TokenUsage};
use crate::session::SessionStore;
use crate::tools::registry::{required_str, ToolRegistry};
use crate::types::{AppError, Message, MessageRole, Result, RunContext, ToolCall};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

pub use hooks::{NoopHooks, RunHooks, RunStats, TelemetryHooks};
pub use state::{RunState, TurnBudget};

const IGNORED_HANDOFF: &str = "Multiple handoffs detected, ignoring this one.";

/// Budgets applied to every run
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub max_turns: usize,
    pub sub_agent_max_turns: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_turns: 50,
            sub_agent_max_turns: 10,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub final_output: String,
    pub last_agent: AgentId,
    pub turns_used: usize,
    pub usage: TokenUsage,
    pub stats: Option<RunStats>,
}

pub struct Runner {
    graph: Arc<AgentGraph>,
    tools: Arc<ToolRegistry>,
    clients: HashMap<AgentId, Arc<dyn LLMClient>>,
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner with one model client per agent
    pub fn new(
        graph: Arc<AgentGraph>,
        tools: Arc<ToolRegistry>,
        factory: &dyn LLMClientFactory,
        config: RunnerConfig,
    ) -> Result<Self> {
        let mut clients = HashMap::new();
        for agent in graph.agents() {
            clients.insert(agent.id, factory.create_client(&agent.model)?);
        }

        Ok(Self {
            graph,
            tools,
            clients,
            config,
        })
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Run one turn with the session's history, appending the exchange on success
    ///
    /// History is left untouched when the run fails or exceeds its budget.
    pub async fn run_with_session(
        &self,
        input: &str,
        ctx: &RunContext,
        session: &dyn SessionStore,
        session_id: &str,
        hooks: &mut dyn RunHooks,
    ) -> Result<RunResult> {
        let history = session.get_messages(session_id).await?;
        let result = self.run(input, &history, ctx, hooks).await?;

        session
            .add_messages(
                session_id,
                &[
                    Message::new(MessageRole::User, input),
                    Message::new(MessageRole::Assistant, result.final_output.clone()),
                ],
            )
            .await?;

        Ok(result)
    }

    /// Run one turn from the graph's entry agent
    pub async fn run(
        &self,
        input: &str,
        history: &[Message],
        ctx: &RunContext,
        hooks: &mut dyn RunHooks,
    ) -> Result<RunResult> {
        let span = info_span!(
            "run",
            run_id = %ctx.run_id,
            workflow = %ctx.workflow_name,
            max_turns = self.config.max_turns
        );

        let state = RunState::Idle.start()?;
        let result = self
            .drive(input, history, ctx, hooks)
            .instrument(span)
            .await;
        let state = state.finish(&result)?;

        match &result {
            Ok(run) => info!(
                run_id = %ctx.run_id,
                %state,
                turns = run.turns_used,
                last_agent = %run.last_agent,
                "Run finished"
            ),
            Err(e) => warn!(run_id = %ctx.run_id, %state, "Run ended: {}", e),
        }
        result
    }

    async fn drive(
        &self,
        input: &str,
        history: &[Message],
        ctx: &RunContext,
        hooks: &mut dyn RunHooks,
    ) -> Result<RunResult> {
        let mut budget = TurnBudget::new(self.config.max_turns);
        let mut usage = TokenUsage::default();
        let mut transcript: Vec<ConversationMessage> = history
            .iter()
            .map(|m| match m.role {
                MessageRole::System => ConversationMessage::system(m.content.clone()),
                MessageRole::User => ConversationMessage::user(m.content.clone()),
                MessageRole::Assistant => ConversationMessage::assistant(m.content.clone(), Vec::new()),
            })
            .collect();
        transcript.push(ConversationMessage::user(input));

        let mut current = self.graph.agent(self.graph.entry())?;
        hooks.on_agent_start(ctx, current);

        loop {
            let tools = self.graph.tool_definitions(current.id, &self.tools)?;
            let client = self.client(current.id)?;

            let mut messages = Vec::with_capacity(transcript.len() + 1);
            messages.push(ConversationMessage::system(current.instructions(ctx)));
            messages.extend(transcript.iter().cloned());

            budget.consume()?;
            hooks.on_llm_start(ctx, current);
            let response = client
                .generate_with_tools_and_history(&messages, &tools, &current.settings)
                .await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }
            hooks.on_llm_end(ctx, current, &response);

            if response.tool_calls.is_empty() {
                hooks.on_agent_end(ctx, current, &response.content);
                return Ok(RunResult {
                    final_output: response.content,
                    last_agent: current.id,
                    turns_used: budget.used(),
                    usage,
                    stats: hooks.snapshot(),
                });
            }

            transcript.push(ConversationMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            // Results are slotted by call position so the transcript keeps issue order
            let mut results: Vec<Option<String>> = vec![None; response.tool_calls.len()];

            for (i, call) in response.tool_calls.iter().enumerate() {
                if self.graph.resolve_handoff(current.id, &call.name).is_some() {
                    continue;
                }
                budget.consume()?;
                let output = self.execute_call(current, call, ctx, hooks, &mut usage).await?;
                results[i] = Some(output);
            }

            let mut handoff: Option<&AgentDefinition> = None;
            for (i, call) in response.tool_calls.iter().enumerate() {
                let Some(target) = self.graph.resolve_handoff(current.id, &call.name) else {
                    continue;
                };
                if handoff.is_some() {
                    debug!(tool = %call.name, "Ignoring additional handoff");
                    results[i] = Some(IGNORED_HANDOFF.to_string());
                    continue;
                }
                budget.consume()?;
                let target = self.graph.agent(target)?;
                results[i] = Some(json!({ "assistant": target.name }).to_string());
                handoff = Some(target);
            }

            for (call, result) in response.tool_calls.iter().zip(results) {
                transcript.push(ConversationMessage::tool_result(
                    call.id.clone(),
                    result.unwrap_or_default(),
                ));
            }

            if let Some(next) = handoff {
                hooks.on_handoff(ctx, current, next);
                current = next;
                hooks.on_agent_start(ctx, current);
            }
        }
    }

    /// Execute a registry tool or sub-agent call issued by `agent`
    async fn execute_call(
        &self,
        agent: &AgentDefinition,
        call: &ToolCall,
        ctx: &RunContext,
        hooks: &mut dyn RunHooks,
        usage: &mut TokenUsage,
    ) -> Result<String> {
        hooks.on_tool_start(ctx, agent, &call.name);

        let output = if let Some(binding) = agent.sub_agent(&call.name) {
            let input = required_str(&call.arguments, "input")?;
            let target = self.graph.agent(binding.target)?;
            self.run_sub_agent(target, input, ctx, usage).await?
        } else if agent.permits_tool(&call.name) {
            let value = self.tools.execute(&call.name, ctx, call.arguments.clone()).await?;
            render_output(value)
        } else {
            return Err(AppError::Tool(format!(
                "Agent '{}' is not permitted to call tool '{}'",
                agent.name, call.name
            )));
        };

        hooks.on_tool_end(ctx, agent, &call.name, &output);
        Ok(output)
    }

    /// Inner loop of a sub-agent called as a tool
    ///
    /// Sub-agents cannot hand off, so this loop only executes registry tools
    /// until the sub-agent replies with text.
    async fn run_sub_agent(
        &self,
        agent: &AgentDefinition,
        input: &str,
        ctx: &RunContext,
        usage: &mut TokenUsage,
    ) -> Result<String> {
        let span = info_span!("sub_agent", agent = %agent.name);
        self.sub_agent_loop(agent, input, ctx, usage)
            .instrument(span)
            .await
    }

    async fn sub_agent_loop(
        &self,
        agent: &AgentDefinition,
        input: &str,
        ctx: &RunContext,
        usage: &mut TokenUsage,
    ) -> Result<String> {
        let mut budget = TurnBudget::new(self.config.sub_agent_max_turns);
        let client = self.client(agent.id)?;
        let tools = self.tools.get_tool_definitions_for(&agent.tool_names());
        let mut messages = vec![
            ConversationMessage::system(agent.instructions(ctx)),
            ConversationMessage::user(input),
        ];

        loop {
            budget.consume()?;
            let response = client
                .generate_with_tools_and_history(&messages, &tools, &agent.settings)
                .await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            if response.tool_calls.is_empty() {
                debug!(turns = budget.used(), "Sub-agent finished");
                return Ok(response.content);
            }

            messages.push(ConversationMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                budget.consume()?;
                if !agent.permits_tool(&call.name) {
                    return Err(AppError::Tool(format!(
                        "Agent '{}' is not permitted to call tool '{}'",
                        agent.name, call.name
                    )));
                }
                let value = self.tools.execute(&call.name, ctx, call.arguments.clone()).await?;
                messages.push(ConversationMessage::tool_result(
                    call.id.clone(),
                    render_output(value),
                ));
            }
        }
    }

    fn client(&self, id: AgentId) -> Result<&Arc<dyn LLMClient>> {
        self.clients
            .get(&id)
            .ok_or_else(|| AppError::Internal(format!("No model client for agent '{}'", id)))
    }
}

fn render_output(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(json!("plain")), "plain");
        assert_eq!(render_output(json!({"a": 1})), "{\"a\":1}");
        assert_eq!(render_output(Value::Null), "null");
    }

    #[test]
    fn test_default_budgets() {
        let config = RunnerConfig::default();
        assert_eq!(config.max_turns, 50);
        assert_eq!(config.sub_agent_max_turns, 10);
    }
}
