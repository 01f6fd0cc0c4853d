//! # Hosted Whisper Client
//!
//! [`SpeechToText`] implementation backed by the hosted Whisper HTTP API.
//! Uploads the staged audio file as a multipart form and returns whatever
//! result shape the API produced; shape normalization is the adapter's job.

use crate::transcription::engine::{EngineTranscript, SpeechToText};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};

/// Socket-level timeout for one transcription call. Timeout policy beyond
/// this belongs to the transport layer, not the pipeline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error body the API returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for the hosted Whisper transcription endpoint.
pub struct WhisperApiEngine {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl WhisperApiEngine {
    /// Build a client for the given API base URL (e.g.
    /// `https://api.openai.com/v1`), key, and model name.
    pub fn new(api_base: &str, api_key: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build transcription HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/audio/transcriptions", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl SpeechToText for WhisperApiEngine {
    async fn transcribe_file(&self, audio_path: &Path) -> Result<EngineTranscript> {
        let file_bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("failed to read staged audio {}", audio_path.display()))?;

        let filename = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        debug!(file = %filename, bytes = file_bytes.len(), model = %self.model,
            "submitting audio for transcription");

        let file_part = Part::bytes(file_bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .context("failed to build multipart file part")?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", "en")
            .text("response_format", "json")
            .text("temperature", "0");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("transcription request failed")?;

        let status = response.status();
        if status.is_success() {
            let transcript: EngineTranscript = response
                .json()
                .await
                .context("failed to parse transcription response")?;
            Ok(transcript)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };

            error!(status = %status.as_u16(), message = %message, "transcription API error");
            Err(anyhow!(
                "transcription API returned {}: {}",
                status.as_u16(),
                message
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_api_base() {
        let engine = WhisperApiEngine::new("https://api.openai.com/v1/", "sk-test", "whisper-1")
            .unwrap();
        assert_eq!(
            engine.endpoint,
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"error": {"message": "Invalid file format."}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Invalid file format.");
    }
}
