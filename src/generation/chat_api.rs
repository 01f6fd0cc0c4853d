//! # Hosted Chat-Completions Client
//!
//! [`ResponseGenerator`] implementation backed by a hosted chat-completions
//! HTTP API. Stored conversation history maps onto API roles, prefixed with
//! a configurable assistant persona as the system prompt.

use crate::conversation::{Message, MessageRole};
use crate::generation::engine::ResponseGenerator;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Socket-level timeout for one generation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for the hosted chat-completions endpoint.
pub struct ChatApiEngine {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    persona_prompt: String,
}

impl ChatApiEngine {
    pub fn new(api_base: &str, api_key: &str, model: &str, persona_prompt: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build generation HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            persona_prompt: persona_prompt.to_string(),
        })
    }

    /// Build the API message list: persona system prompt, prior turns in
    /// stored order, then the current utterance.
    fn build_messages(&self, text: &str, history: &[Message]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: self.persona_prompt.clone(),
        });

        for entry in history {
            messages.push(ChatMessage {
                role: match entry.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: entry.content.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: text.to_string(),
        });
        messages
    }
}

#[async_trait]
impl ResponseGenerator for ChatApiEngine {
    async fn generate(&self, text: &str, history: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(text, history),
            temperature: 0.8,
            max_tokens: 300,
        };

        debug!(model = %self.model, history_len = history.len(),
            "requesting chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };

            error!(status = %status.as_u16(), message = %message, "chat API error");
            return Err(anyhow!("chat API returned {}: {}", status.as_u16(), message));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse chat completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat API returned no completion choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn engine() -> ChatApiEngine {
        ChatApiEngine::new(
            "https://api.openai.com/v1/",
            "sk-test",
            "gpt-4o-mini",
            "You are a cheerful little robot companion.",
        )
        .unwrap()
    }

    fn history_message(role: MessageRole, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_endpoint_built_from_api_base() {
        assert_eq!(engine().endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_message_list_order_and_roles() {
        let history = vec![
            history_message(MessageRole::User, "hello"),
            history_message(MessageRole::Assistant, "hi! what can I do?"),
        ];
        let messages = engine().build_messages("turn on the lights", &history);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "turn on the lights");
    }

    #[test]
    fn test_empty_history_has_system_and_user_only() {
        let messages = engine().build_messages("hello", &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Sure thing!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Sure thing!")
        );
    }
}
