//! # Voice Input Handler
//!
//! `POST /api/voice/input`: the endpoint embedded devices post raw PCM
//! audio to. The body is the bare byte stream (`application/octet-stream`);
//! the conversation to continue, if any, arrives as a query parameter or
//! header because the device cannot easily build multipart requests.

use crate::audio::DeclaredFormat;
use crate::error::VoiceError;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceQuery {
    /// Conversation to continue; omitted on the first turn.
    conversation_id: Option<String>,
    /// Declared audio format tag; raw PCM when omitted.
    format: Option<String>,
}

pub async fn voice_input(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<VoiceQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, VoiceError> {
    // Query parameter wins; the header exists for clients whose HTTP
    // libraries make query strings awkward.
    let conversation_hint = query.conversation_id.clone().or_else(|| {
        req.headers()
            .get("X-Conversation-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let format = DeclaredFormat::from_tag(query.format.as_deref().unwrap_or("pcm"));

    let outcome = state
        .pipeline
        .process_voice_input(&body, format, conversation_hint.as_deref())
        .await?;
    state.record_voice_turn();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "conversationId": outcome.conversation_id,
        "transcript": outcome.transcript,
        "userMessage": outcome.user_message,
        "assistantMessage": outcome.assistant_message,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::conversation::{ConversationStore, MemoryStore, Message};
    use crate::generation::ResponseGenerator;
    use crate::transcription::{EngineTranscript, SpeechToText};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;

    struct FixedSpeech(&'static str);

    #[async_trait]
    impl SpeechToText for FixedSpeech {
        async fn transcribe_file(&self, _path: &Path) -> anyhow::Result<EngineTranscript> {
            Ok(EngineTranscript::Plain(self.0.to_string()))
        }
    }

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl ResponseGenerator for FixedGenerator {
        async fn generate(&self, _text: &str, _history: &[Message]) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn test_state(transcript: &'static str) -> AppState {
        AppState::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(FixedSpeech(transcript)),
            Arc::new(FixedGenerator("Sure thing!")),
        )
    }

    #[actix_web::test]
    async fn test_voice_turn_over_http() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state("turn on the lights")))
                .route("/api/voice/input", web::post().to(voice_input)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/voice/input")
            .set_payload(vec![0u8; 1000])
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["transcript"], "turn on the lights");
        assert_eq!(body["userMessage"]["role"], "USER");
        assert_eq!(body["userMessage"]["content"], "turn on the lights");
        assert_eq!(body["assistantMessage"]["role"], "ASSISTANT");
        assert_eq!(body["assistantMessage"]["content"], "Sure thing!");
        assert!(body["conversationId"].is_string());
    }

    #[actix_web::test]
    async fn test_empty_body_maps_to_empty_audio() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state("ignored")))
                .route("/api/voice/input", web::post().to(voice_input)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/voice/input")
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 400);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"]["code"], "empty_audio");
    }

    #[actix_web::test]
    async fn test_unknown_conversation_maps_to_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state("hello")))
                .route("/api/voice/input", web::post().to(voice_input)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!(
                "/api/voice/input?conversationId={}",
                uuid::Uuid::new_v4()
            ))
            .set_payload(vec![0u8; 100])
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 404);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"]["code"], "conversation_not_found");
    }

    #[actix_web::test]
    async fn test_conversation_id_header_is_honored() {
        let state = test_state("hello again");
        let store = state.store.clone();
        let existing = store.create_conversation("earlier").await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/api/voice/input", web::post().to(voice_input)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/voice/input")
            .insert_header(("X-Conversation-Id", existing.id.to_string()))
            .set_payload(vec![0u8; 100])
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["conversationId"], existing.id.to_string());
    }
}
