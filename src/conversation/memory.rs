//! # In-Process Conversation Store
//!
//! HashMap-backed implementation of [`ConversationStore`]. Every operation
//! takes the lock once and performs its whole mutation inside it, so each
//! append is one atomic write as the store contract requires.

use crate::conversation::store::{
    Conversation, ConversationStore, ConversationSummary, Message, MessageRole,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Thread-safe in-memory store.
///
/// ## Concurrency:
/// Uses the same Arc<RwLock<HashMap>> shape as the rest of the service
/// state: many concurrent readers, one writer at a time. No await points
/// ever occur while the lock is held.
#[derive(Clone, Default)]
pub struct MemoryStore {
    conversations: Arc<RwLock<HashMap<Uuid, Conversation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| anyhow!("conversation store lock poisoned"))?;
        Ok(conversations.get(&id).cloned())
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            title: title.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| anyhow!("conversation store lock poisoned"))?;
        conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| anyhow!("conversation store lock poisoned"))?;

        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| anyhow!("conversation {} does not exist", conversation_id))?;

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        };

        conversation.messages.push(message.clone());
        conversation.updated_at = message.timestamp;
        Ok(message)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| anyhow!("conversation store lock poisoned"))?;

        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .map(|c| ConversationSummary {
                id: c.id,
                title: c.title.clone(),
                message_count: c.messages.len(),
                updated_at: c.updated_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| anyhow!("conversation store lock poisoned"))?;
        Ok(conversations.remove(&id).is_some())
    }
}
