//! # Error Handling
//!
//! Defines the failure taxonomy for the voice pipeline and how each kind is
//! converted to an HTTP response.
//!
//! ## Design:
//! Every failure from an external collaborator (transcription engine, chat
//! engine, durable store) is caught at its call site, logged with full
//! detail, and re-raised as one of the domain kinds below. Callers always
//! receive a stable machine-readable code and a safe message; the raw
//! collaborator detail only reaches the response body when the service runs
//! in the development environment.
//!
//! ## HTTP Status Mapping:
//! - EmptyAudio / AudioTooLarge / EmptyTranscript → 400 (resend or retry speaking)
//! - ConversationNotFound → 404 (correct the identifier or start fresh)
//! - TranscriptionEngine / ResponseGeneration → 502 (an upstream engine failed)
//! - Storage → 500 (the durable store failed)

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::env;
use std::fmt;

/// Failure kinds surfaced by the voice pipeline.
///
/// ## Retry Semantics:
/// None of these are retried automatically by the pipeline. The variants
/// carrying a `String` wrap the underlying collaborator's message; the rest
/// are pure validation outcomes with no interesting detail to carry.
#[derive(Debug)]
pub enum VoiceError {
    /// No audio bytes were received (absent or zero-length body).
    EmptyAudio,

    /// The audio payload exceeds the configured maximum clip size.
    AudioTooLarge { limit: usize, actual: usize },

    /// The transcription engine itself failed (network, quota, undecodable audio).
    TranscriptionEngine(String),

    /// The engine succeeded but produced no usable text after trimming.
    EmptyTranscript,

    /// An explicitly supplied conversation identifier did not resolve.
    ConversationNotFound(String),

    /// The response-generation engine failed after the user message was stored.
    ResponseGeneration(String),

    /// The durable store failed a read or write.
    Storage(String),
}

impl VoiceError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            VoiceError::EmptyAudio => "empty_audio",
            VoiceError::AudioTooLarge { .. } => "audio_too_large",
            VoiceError::TranscriptionEngine(_) => "transcription_failed",
            VoiceError::EmptyTranscript => "empty_transcript",
            VoiceError::ConversationNotFound(_) => "conversation_not_found",
            VoiceError::ResponseGeneration(_) => "response_failed",
            VoiceError::Storage(_) => "storage_error",
        }
    }

    /// Message that is always safe to show a caller, regardless of environment.
    ///
    /// Validation failures describe exactly what the caller must change;
    /// collaborator failures get a generic phrasing because their raw detail
    /// may leak internals (hosts, keys, quota identifiers).
    fn safe_message(&self) -> String {
        match self {
            VoiceError::EmptyAudio => "No audio data received".to_string(),
            VoiceError::AudioTooLarge { limit, .. } => {
                format!("Audio data too large (max {} bytes)", limit)
            }
            VoiceError::TranscriptionEngine(_) => "Failed to transcribe audio".to_string(),
            VoiceError::EmptyTranscript => {
                "Could not transcribe audio. Please try again.".to_string()
            }
            VoiceError::ConversationNotFound(_) => "Conversation not found".to_string(),
            VoiceError::ResponseGeneration(_) => "Failed to generate a response".to_string(),
            VoiceError::Storage(_) => "Failed to persist the conversation".to_string(),
        }
    }

    /// Internal diagnostic detail, if this kind carries any.
    fn detail(&self) -> Option<&str> {
        match self {
            VoiceError::TranscriptionEngine(msg)
            | VoiceError::ResponseGeneration(msg)
            | VoiceError::Storage(msg) => Some(msg.as_str()),
            VoiceError::ConversationNotFound(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceError::EmptyAudio => write!(f, "empty audio payload"),
            VoiceError::AudioTooLarge { limit, actual } => {
                write!(f, "audio payload of {} bytes exceeds limit of {}", actual, limit)
            }
            VoiceError::TranscriptionEngine(msg) => {
                write!(f, "transcription engine failure: {}", msg)
            }
            VoiceError::EmptyTranscript => write!(f, "transcription produced no usable text"),
            VoiceError::ConversationNotFound(id) => write!(f, "conversation {} not found", id),
            VoiceError::ResponseGeneration(msg) => {
                write!(f, "response generation failure: {}", msg)
            }
            VoiceError::Storage(msg) => write!(f, "storage failure: {}", msg),
        }
    }
}

impl std::error::Error for VoiceError {}

/// Whether raw collaborator detail may be included in HTTP error bodies.
///
/// Mirrors the `server.environment` configuration key: the `config` crate
/// maps it to this environment variable, which is the only place the error
/// layer can reach without threading state through `ResponseError`.
fn development_mode() -> bool {
    matches!(
        env::var("APP_SERVER_ENVIRONMENT").as_deref(),
        Ok("development")
    )
}

impl ResponseError for VoiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            VoiceError::EmptyAudio
            | VoiceError::AudioTooLarge { .. }
            | VoiceError::EmptyTranscript => StatusCode::BAD_REQUEST,
            VoiceError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            VoiceError::TranscriptionEngine(_) | VoiceError::ResponseGeneration(_) => {
                StatusCode::BAD_GATEWAY
            }
            VoiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": {
                "code": self.code(),
                "message": self.safe_message(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        });

        if development_mode() {
            if let Some(detail) = self.detail() {
                body["error"]["detail"] = json!(detail);
            }
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Shorthand for pipeline results.
pub type VoiceResult<T> = Result<T, VoiceError>;
