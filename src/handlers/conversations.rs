//! # Conversation Handlers
//!
//! Listing, retrieval, and administrative deletion of conversations. The
//! pipeline never deletes anything; removal only happens through the
//! explicit endpoint here.

use crate::error::VoiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

pub async fn list_conversations(state: web::Data<AppState>) -> Result<HttpResponse, VoiceError> {
    let conversations = state
        .store
        .list_conversations()
        .await
        .map_err(|e| VoiceError::Storage(e.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "conversations": conversations })))
}

pub async fn get_conversation(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, VoiceError> {
    let raw_id = path.into_inner();
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| VoiceError::ConversationNotFound(raw_id.clone()))?;

    let conversation = state
        .store
        .find_conversation(id)
        .await
        .map_err(|e| VoiceError::Storage(e.to_string()))?
        .ok_or(VoiceError::ConversationNotFound(raw_id))?;

    Ok(HttpResponse::Ok().json(conversation))
}

pub async fn delete_conversation(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, VoiceError> {
    let raw_id = path.into_inner();
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| VoiceError::ConversationNotFound(raw_id.clone()))?;

    let removed = state
        .store
        .delete_conversation(id)
        .await
        .map_err(|e| VoiceError::Storage(e.to_string()))?;

    if !removed {
        return Err(VoiceError::ConversationNotFound(raw_id));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true, "deleted": id })))
}
