//! # Text Chat Handler
//!
//! `POST /api/chat/message`: the browser UI's typed-message counterpart to
//! the voice endpoint. Runs the same resolve/append/generate/append path,
//! so text and voice turns land in the same conversation history and the
//! same live feed.

use crate::error::VoiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

pub async fn post_message(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, VoiceError> {
    let outcome = state
        .pipeline
        .process_text_input(&body.message, body.conversation_id.as_deref())
        .await?;
    state.record_chat_turn();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "conversationId": outcome.conversation_id,
        "userMessage": outcome.user_message,
        "assistantMessage": outcome.assistant_message,
    })))
}
