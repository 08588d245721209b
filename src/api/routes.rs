use crate::api::handlers::chat;
use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/session", delete(chat::clear_session))
        .route("/agents", get(chat::list_agents))
}

/// Full application: `/health` plus the API under `/api`, with tracing and CORS
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(chat::health))
        .nest("/api", create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
