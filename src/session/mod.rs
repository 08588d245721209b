//! Conversation sessions
//!
//! A session is the ordered user/assistant history replayed to the coordinator
//! on every turn. It only grows, except through an explicit clear.

pub mod sqlite;

use crate::types::{Message, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub use sqlite::SqliteSessionStore;

/// Phrases that clear the session instead of starting a run
pub const CLEAR_COMMANDS: &[&str] = &[
    "remove session",
    "delete session",
    "remove session history",
    "delete session history",
];

/// Exact match after trimming, ignoring case
pub fn is_clear_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    CLEAR_COMMANDS.contains(&normalized.as_str())
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Full history of `session_id`, oldest first
    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>>;

    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()>;

    /// Remove every message of `session_id`; a no-op for unknown sessions
    async fn clear_session(&self, session_id: &str) -> Result<()>;
}

/// Process-local store, used by tests and when `database` is left empty
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn clear_session(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }
}

/// Open the store named by `[session].database`
///
/// An empty path keeps history in process memory only.
pub async fn open_store(database: &str) -> Result<Arc<dyn SessionStore>> {
    if database.trim().is_empty() {
        info!("No session database configured, keeping history in memory");
        return Ok(Arc::new(InMemorySessionStore::new()));
    }
    Ok(Arc::new(SqliteSessionStore::open(database).await?))
}
