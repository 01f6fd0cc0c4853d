//! # Conversation Resolution
//!
//! Given an optional identifier from the caller, either loads the existing
//! conversation (with its full ordered history) or implicitly creates a new
//! one, seeding its title from the first utterance.

use crate::conversation::store::{Conversation, ConversationStore};
use crate::error::{VoiceError, VoiceResult};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Longest title stored for an implicitly created conversation, in
/// characters (not bytes; utterances are arbitrary UTF-8).
pub const MAX_TITLE_CHARS: usize = 50;

/// Marker appended when a seed utterance was cut to fit.
const TRUNCATION_MARKER: &str = "...";

/// Resolves or implicitly creates the conversation a turn belongs to.
pub struct ConversationResolver {
    store: Arc<dyn ConversationStore>,
}

impl ConversationResolver {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Resolve an explicit identifier, or create a new conversation titled
    /// from `seed_text`.
    ///
    /// ## Contract:
    /// - An identifier that does not resolve (including one that is not a
    ///   well-formed UUID) fails with `ConversationNotFound`; nothing is
    ///   created or appended in that case.
    /// - With no identifier, creation is a durable write and the returned
    ///   conversation has an empty history.
    pub async fn resolve_or_create(
        &self,
        id_hint: Option<&str>,
        seed_text: &str,
    ) -> VoiceResult<Conversation> {
        match id_hint {
            Some(raw_id) => {
                let id = Uuid::parse_str(raw_id)
                    .map_err(|_| VoiceError::ConversationNotFound(raw_id.to_string()))?;

                let found = self.store.find_conversation(id).await.map_err(|e| {
                    error!(conversation_id = %id, error = %e, "conversation lookup failed");
                    VoiceError::Storage(e.to_string())
                })?;

                found.ok_or_else(|| VoiceError::ConversationNotFound(raw_id.to_string()))
            }
            None => {
                let title = derive_title(seed_text);
                let conversation =
                    self.store.create_conversation(&title).await.map_err(|e| {
                        error!(error = %e, "conversation creation failed");
                        VoiceError::Storage(e.to_string())
                    })?;

                info!(conversation_id = %conversation.id, title = %conversation.title,
                    "created conversation implicitly");
                Ok(conversation)
            }
        }
    }
}

/// Derive a display title from the first utterance.
///
/// Truncates to [`MAX_TITLE_CHARS`] characters and appends `...` only when
/// something was actually cut.
pub fn derive_title(seed_text: &str) -> String {
    let mut title: String = seed_text.chars().take(MAX_TITLE_CHARS).collect();
    if seed_text.chars().count() > MAX_TITLE_CHARS {
        title.push_str(TRUNCATION_MARKER);
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::MemoryStore;

    fn resolver_with_store() -> (ConversationResolver, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ConversationResolver::new(store.clone()), store)
    }

    #[test]
    fn test_short_seed_is_kept_verbatim() {
        let seed = "Hello BMO how are you today my friend";
        assert_eq!(derive_title(seed), seed);
    }

    #[test]
    fn test_long_seed_is_truncated_with_marker() {
        let seed = "a".repeat(60);
        let title = derive_title(&seed);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_exactly_fifty_chars_gets_no_marker() {
        let seed = "b".repeat(50);
        assert_eq!(derive_title(&seed), seed);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 60 multi-byte characters must cut at the 50th character, not byte
        let seed = "é".repeat(60);
        let title = derive_title(&seed);
        assert_eq!(title.chars().count(), 53); // 50 kept + "..."
        assert!(title.starts_with(&"é".repeat(50)));
    }

    #[tokio::test]
    async fn test_missing_hint_creates_titled_conversation() {
        let (resolver, store) = resolver_with_store();
        let conversation = resolver
            .resolve_or_create(None, "turn on the lights")
            .await
            .unwrap();

        assert_eq!(conversation.title, "turn on the lights");
        assert!(conversation.messages.is_empty());
        assert!(store
            .find_conversation(conversation.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_explicit_hint_loads_history() {
        let (resolver, store) = resolver_with_store();
        let existing = store.create_conversation("earlier chat").await.unwrap();

        let resolved = resolver
            .resolve_or_create(Some(&existing.id.to_string()), "ignored seed")
            .await
            .unwrap();
        assert_eq!(resolved.id, existing.id);
        assert_eq!(resolved.title, "earlier chat");
    }

    #[tokio::test]
    async fn test_unknown_hint_is_not_found() {
        let (resolver, _) = resolver_with_store();
        let err = resolver
            .resolve_or_create(Some(&Uuid::new_v4().to_string()), "seed")
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_hint_is_not_found() {
        let (resolver, _) = resolver_with_store();
        let err = resolver
            .resolve_or_create(Some("not-a-uuid"), "seed")
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::ConversationNotFound(_)));
    }
}
