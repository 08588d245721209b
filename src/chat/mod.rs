//! Chat service shared by every front-end
//!
//! Turns one line of user input into exactly one reply: the clear-command
//! confirmation, the run's final text, the turn-limit notice or `Error:<msg>`.

use crate::runner::{RunStats, Runner, TelemetryHooks};
use crate::session::{is_clear_command, SessionStore};
use crate::types::{AppError, ReplyStatus, RunContext, UserProfile};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

pub const WELCOME_MESSAGE: &str =
    "Hello! I am DeepSearch Agent , your personal assistant. How can I help you today?";
pub const MAX_TURNS_MESSAGE: &str = "Max Turns Exceeded. Please ask your Question again.";
pub const SESSION_CLEARED_MESSAGE: &str = "Your session history has been cleared.";

/// What the user sees for one turn
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub status: ReplyStatus,
    pub stats: Option<RunStats>,
}

impl ChatReply {
    fn new(text: impl Into<String>, status: ReplyStatus) -> Self {
        Self {
            text: text.into(),
            status,
            stats: None,
        }
    }

    fn failed(error: &AppError) -> Self {
        Self::new(format!("Error:{}", error), ReplyStatus::Failed)
    }
}

pub struct ChatService {
    runner: Arc<Runner>,
    sessions: Arc<dyn SessionStore>,
    session_id: String,
    profile: UserProfile,
    workflow_name: String,
    // One run at a time; the next turn waits for the previous one
    turn_lock: Mutex<()>,
}

impl ChatService {
    pub fn new(
        runner: Arc<Runner>,
        sessions: Arc<dyn SessionStore>,
        session_id: impl Into<String>,
        profile: UserProfile,
        workflow_name: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            sessions,
            session_id: session_id.into(),
            profile,
            workflow_name: workflow_name.into(),
            turn_lock: Mutex::new(()),
        }
    }

    pub fn welcome(&self) -> &'static str {
        WELCOME_MESSAGE
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Handle one line of user input
    pub async fn handle(&self, input: &str) -> ChatReply {
        let _turn = self.turn_lock.lock().await;

        if is_clear_command(input) {
            return self.clear_locked().await;
        }

        let ctx = RunContext::new(self.profile.clone(), self.workflow_name.clone());
        let mut hooks = TelemetryHooks::new();

        let result = self
            .runner
            .run_with_session(
                input,
                &ctx,
                self.sessions.as_ref(),
                &self.session_id,
                &mut hooks,
            )
            .await;

        match result {
            Ok(run) => ChatReply {
                text: run.final_output,
                status: ReplyStatus::Completed,
                stats: run.stats,
            },
            Err(AppError::MaxTurnsExceeded(max)) => {
                info!(run_id = %ctx.run_id, max, "Turn budget exhausted");
                ChatReply {
                    stats: Some(hooks.stats().clone()),
                    ..ChatReply::new(MAX_TURNS_MESSAGE, ReplyStatus::TurnsExceeded)
                }
            }
            Err(e) => {
                error!(run_id = %ctx.run_id, "Error:{}", e);
                ChatReply {
                    stats: Some(hooks.stats().clone()),
                    ..ChatReply::failed(&e)
                }
            }
        }
    }

    /// Empty the session, waiting for any run in progress
    pub async fn clear(&self) -> ChatReply {
        let _turn = self.turn_lock.lock().await;
        self.clear_locked().await
    }

    async fn clear_locked(&self) -> ChatReply {
        match self.sessions.clear_session(&self.session_id).await {
            Ok(()) => {
                info!(session_id = %self.session_id, "Session history removed");
                ChatReply::new(SESSION_CLEARED_MESSAGE, ReplyStatus::SessionCleared)
            }
            Err(e) => ChatReply::failed(&e),
        }
    }
}
