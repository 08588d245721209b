//! API request handlers.

/// Chat, session, health and topology handlers.
pub mod chat;
