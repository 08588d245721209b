use super::SessionStore;
use crate::types::{AppError, Message, MessageRole, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use std::path::Path;
use tracing::info;

/// Session history in a local SQLite file
pub struct SqliteSessionStore {
    // Keeps the database alive for the connection
    _db: Database,
    conn: Connection,
}

impl SqliteSessionStore {
    /// Open (or create) the database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create {:?}: {}", parent, e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {:?}: {}", path, e)))?;

        let store = Self::from_database(db).await?;
        info!("Session store opened at {:?}", path);
        Ok(store)
    }

    /// A database that lives as long as this store
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        let store = Self { _db: db, conn };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS agent_messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create messages table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_agent_messages_session
                 ON agent_messages (session_id, id)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let mut rows = self
            .conn
            .query(
                "SELECT role, content, created_at FROM agent_messages
                 WHERE session_id = ? ORDER BY id ASC",
                [session_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let role: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
            let content: String = row.get(1).map_err(|e| AppError::Database(e.to_string()))?;
            let created_at: i64 = row.get(2).map_err(|e| AppError::Database(e.to_string()))?;
            let timestamp = chrono::DateTime::from_timestamp_millis(created_at).ok_or_else(|| {
                AppError::Database(format!("Invalid timestamp in session: {}", created_at))
            })?;

            messages.push(Message {
                role: MessageRole::parse(&role),
                content,
                timestamp,
            });
        }

        Ok(messages)
    }

    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for message in messages {
            tx.execute(
                "INSERT INTO agent_messages (session_id, role, content, created_at)
                 VALUES (?, ?, ?, ?)",
                (
                    session_id,
                    message.role.as_str(),
                    message.content.as_str(),
                    message.timestamp.timestamp_millis(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to add message: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit messages: {}", e)))
    }

    async fn clear_session(&self, session_id: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM agent_messages WHERE session_id = ?",
                [session_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to clear session: {}", e)))?;
        Ok(())
    }
}
