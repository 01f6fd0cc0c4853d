//! # Voice Turn Pipeline
//!
//! The single externally invoked operation of the service: take an untrusted
//! audio payload from a device, produce a transcript and a generated reply,
//! and leave the exchange durably recorded.
//!
//! ## Step Order:
//! 1. Validate the payload (present, within the clip size limit)
//! 2. Frame and transcribe; reject an empty transcript
//! 3. Resolve or implicitly create the conversation
//! 4. Append the USER message (durable before generation starts)
//! 5. Generate the assistant reply from the transcript and the
//!    pre-append history
//! 6. Append the ASSISTANT message
//! 7. Assemble the multi-part result bundle
//!
//! ## Partial-Failure Policy:
//! If generation or the assistant append fails after step 4 succeeded, the
//! user message stays persisted; conversation history never silently loses
//! a user's spoken input, even when the reply could not be produced. The
//! failure is surfaced to the caller as-is.
//!
//! Steps are strictly sequential within one turn. Concurrent turns against
//! the same conversation interleave in store timestamp order; that is
//! accepted behavior, not a defect, because conversational order is advisory
//! across clients.

use crate::audio::DeclaredFormat;
use crate::config::VoiceConfig;
use crate::conversation::{
    ConversationResolver, ConversationStore, Message, MessageRole, MessageSequencer,
};
use crate::error::{VoiceError, VoiceResult};
use crate::events::MessageBroadcaster;
use crate::generation::{ResponseGenerator, ResponseOrchestrator};
use crate::transcription::{SpeechToText, TranscriptionAdapter};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Result bundle of one completed turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTurnOutcome {
    pub conversation_id: Uuid,
    pub transcript: String,
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Composes framing, transcription, resolution, sequencing, and generation
/// into one end-to-end operation.
///
/// All collaborators are injected, so the whole pipeline runs against fakes
/// in tests and against the hosted engines plus the real store in the
/// service.
pub struct VoicePipeline {
    adapter: TranscriptionAdapter,
    resolver: ConversationResolver,
    sequencer: MessageSequencer,
    orchestrator: ResponseOrchestrator,
    max_audio_bytes: usize,
}

impl VoicePipeline {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        speech: Arc<dyn SpeechToText>,
        generator: Arc<dyn ResponseGenerator>,
        events: MessageBroadcaster,
        voice_config: &VoiceConfig,
    ) -> Self {
        Self {
            adapter: TranscriptionAdapter::new(speech, voice_config.pcm_spec()),
            resolver: ConversationResolver::new(store.clone()),
            sequencer: MessageSequencer::new(store, events),
            orchestrator: ResponseOrchestrator::new(generator),
            max_audio_bytes: voice_config.max_audio_bytes,
        }
    }

    /// Process one voice turn end to end.
    pub async fn process_voice_input(
        &self,
        audio: &[u8],
        format: DeclaredFormat,
        conversation_hint: Option<&str>,
    ) -> VoiceResult<VoiceTurnOutcome> {
        if audio.is_empty() {
            return Err(VoiceError::EmptyAudio);
        }

        if audio.len() > self.max_audio_bytes {
            return Err(VoiceError::AudioTooLarge {
                limit: self.max_audio_bytes,
                actual: audio.len(),
            });
        }

        info!(bytes = audio.len(), "received voice input");

        let transcript = self.adapter.transcribe(audio, &format).await?;
        if transcript.is_empty() {
            return Err(VoiceError::EmptyTranscript);
        }

        info!(transcript = %transcript, "transcribed voice input");
        self.complete_turn(&transcript, conversation_hint).await
    }

    /// Process one typed text turn.
    ///
    /// Shares steps 3-7 with the voice path; the transcript is simply the
    /// typed message, and an empty message fails the same way an inaudible
    /// clip does.
    pub async fn process_text_input(
        &self,
        text: &str,
        conversation_hint: Option<&str>,
    ) -> VoiceResult<VoiceTurnOutcome> {
        let transcript = text.trim();
        if transcript.is_empty() {
            return Err(VoiceError::EmptyTranscript);
        }

        self.complete_turn(transcript, conversation_hint).await
    }

    /// Steps 3-7: resolve, append USER, generate, append ASSISTANT, bundle.
    async fn complete_turn(
        &self,
        transcript: &str,
        conversation_hint: Option<&str>,
    ) -> VoiceResult<VoiceTurnOutcome> {
        let conversation = self
            .resolver
            .resolve_or_create(conversation_hint, transcript)
            .await?;

        // The user message must be durable before generation is invoked.
        let user_message = self
            .sequencer
            .append(conversation.id, MessageRole::User, transcript)
            .await?;

        // History is passed exactly as the resolver produced it: prior
        // turns only, without the just-appended user message.
        let reply = self
            .orchestrator
            .generate(transcript, &conversation.messages)
            .await?;

        let assistant_message = self
            .sequencer
            .append(conversation.id, MessageRole::Assistant, &reply)
            .await?;

        info!(conversation_id = %conversation.id,
            user_message_id = %user_message.id,
            assistant_message_id = %assistant_message.id,
            "voice turn completed");

        Ok(VoiceTurnOutcome {
            conversation_id: conversation.id,
            transcript: transcript.to_string(),
            user_message,
            assistant_message,
        })
    }
}
