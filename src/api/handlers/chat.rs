use crate::{
    agents::AgentId,
    types::{AppError, ChatRequest, ChatResponse, Result},
    AppState,
};
use axum::{extract::State, Json};
use serde::Serialize;

/// Run one chat turn
///
/// Turn-limit and run failures are ordinary replies (their `status` says
/// which); only malformed requests are HTTP errors.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::InvalidInput("message must not be empty".to_string()));
    }

    let reply = state.chat.handle(&payload.message).await;
    Ok(Json(ChatResponse {
        response: reply.text,
        status: reply.status,
    }))
}

/// Clear the configured session's history
pub async fn clear_session(State(state): State<AppState>) -> Json<ChatResponse> {
    let reply = state.chat.clear().await;
    Json(ChatResponse {
        response: reply.text,
        status: reply.status,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct AgentInfo {
    pub id: AgentId,
    pub name: String,
    pub model: String,
    pub tools: Vec<String>,
    pub handoffs: Vec<AgentId>,
    pub sub_agents: Vec<String>,
}

/// The validated agent topology
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    let graph = state.chat.runner().graph();
    Json(
        graph
            .agents()
            .map(|agent| AgentInfo {
                id: agent.id,
                name: agent.name.clone(),
                model: agent.model.clone(),
                tools: agent.tools.clone(),
                handoffs: graph.handoff_targets(agent.id).to_vec(),
                sub_agents: agent
                    .sub_agents
                    .iter()
                    .map(|b| b.tool_name.clone())
                    .collect(),
            })
            .collect(),
    )
}
