//! # Message Sequencing
//!
//! Performs the ordered durable appends of a turn: USER strictly before
//! response generation, ASSISTANT strictly after. Each append is one atomic
//! store write; once it returns, the message exists durably and is also
//! handed to the fan-out channel for live viewers.

use crate::conversation::store::{ConversationStore, Message, MessageRole};
use crate::error::{VoiceError, VoiceResult};
use crate::events::MessageBroadcaster;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Appends messages in causal order and broadcasts each stored message.
pub struct MessageSequencer {
    store: Arc<dyn ConversationStore>,
    events: MessageBroadcaster,
}

impl MessageSequencer {
    pub fn new(store: Arc<dyn ConversationStore>, events: MessageBroadcaster) -> Self {
        Self { store, events }
    }

    /// Durably append one message and fan it out to viewers.
    ///
    /// The broadcast happens only after the write returns, so viewers never
    /// see a message that is not yet persisted. Fan-out itself is
    /// fire-and-forget and cannot fail the append.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> VoiceResult<Message> {
        let message = self
            .store
            .append_message(conversation_id, role, content)
            .await
            .map_err(|e| {
                error!(conversation_id = %conversation_id, role = ?role, error = %e,
                    "message append failed");
                VoiceError::Storage(e.to_string())
            })?;

        debug!(message_id = %message.id, conversation_id = %conversation_id,
            role = ?role, "message stored");
        self.events.publish(&message);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::MemoryStore;

    #[tokio::test]
    async fn test_append_stores_and_broadcasts() {
        let store = Arc::new(MemoryStore::new());
        let events = MessageBroadcaster::new();
        let mut feed = events.subscribe();
        let sequencer = MessageSequencer::new(store.clone(), events);

        let conversation = store.create_conversation("test").await.unwrap();
        let message = sequencer
            .append(conversation.id, MessageRole::User, "hello")
            .await
            .unwrap();

        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, "hello");

        // durably stored
        let reloaded = store
            .find_conversation(conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.messages.len(), 1);

        // and fanned out
        let broadcast = feed.recv().await.unwrap();
        assert_eq!(broadcast.id, message.id);
    }

    #[tokio::test]
    async fn test_append_failure_maps_to_storage_error() {
        let store = Arc::new(MemoryStore::new());
        let sequencer = MessageSequencer::new(store, MessageBroadcaster::new());

        let err = sequencer
            .append(Uuid::new_v4(), MessageRole::User, "orphan")
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Storage(_)));
    }
}
