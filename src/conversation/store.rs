//! # Durable Store Boundary
//!
//! Data model and the trait the pipeline persists through. The store is the
//! only shared mutable resource in the system; each append is a single
//! atomic write, and implementations are responsible for their own per-row
//! atomicity. Concurrent turns against the same conversation interleave in
//! store-assigned timestamp order, which is accepted behavior.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One utterance in a conversation.
///
/// A message belongs to exactly one conversation and is never reassigned.
/// Ordering within a conversation is creation-time order as assigned by the
/// store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A titled, ordered exchange between a user and the assistant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing view of a conversation, without its message bodies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// The durable-store capability the pipeline is written against.
///
/// Kept deliberately narrow so the pipeline controller can be exercised with
/// substitutable implementations; the service wires in [`super::MemoryStore`]
/// and tests do the same.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a conversation with its full ordered message history.
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Create a new, empty conversation with the given title.
    async fn create_conversation(&self, title: &str) -> Result<Conversation>;

    /// Append one message to a conversation's history as an atomic durable
    /// write, returning the stored message with its generated identifier and
    /// timestamp. Also bumps the conversation's `updated_at`.
    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message>;

    /// All conversations, most recently updated first.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Administrative deletion. Returns whether the conversation existed.
    async fn delete_conversation(&self, id: Uuid) -> Result<bool>;
}
