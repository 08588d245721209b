//! HTTP API Handlers and Routes
//!
//! A small axum surface over the chat service.
//!
//! # API Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/chat` - `{"message": ...}` to `{"response": ..., "status": ...}`
//! - `DELETE /api/session` - Clear the configured session's history
//! - `GET /api/agents` - The agent topology

/// Request handlers.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
