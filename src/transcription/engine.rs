//! # Speech-To-Text Capability Contract
//!
//! The trait the adapter invokes and the result shape engines are allowed to
//! return. Engines consume a staged audio file rather than in-memory bytes
//! because every hosted transcription API (and most local ones) takes file
//! uploads; the adapter owns staging and cleanup.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// What a transcription engine may hand back.
///
/// Hosted engines answer with either a bare string or a JSON object carrying
/// a `text` field, depending on the response format negotiated. The untagged
/// union captures both so the ambiguity is resolved here, once, and never
/// propagates further into the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EngineTranscript {
    /// Structured result; `text` may be absent on degenerate responses.
    Structured { text: Option<String> },
    /// Plain-string result.
    Plain(String),
}

impl EngineTranscript {
    /// Collapse either shape to a single string. A missing text field
    /// normalizes to the empty string (the pipeline treats that as an
    /// empty-transcript validation failure, not an engine error).
    pub fn into_text(self) -> String {
        match self {
            EngineTranscript::Plain(text) => text,
            EngineTranscript::Structured { text } => text.unwrap_or_default(),
        }
    }
}

/// The transcription capability the pipeline is written against.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio file at `audio_path`.
    ///
    /// Any failure (network, quota, audio the engine cannot parse) surfaces
    /// as an error; an empty transcript is a *successful* result.
    async fn transcribe_file(&self, audio_path: &Path) -> Result<EngineTranscript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_shape_parses() {
        let parsed: EngineTranscript = serde_json::from_str(r#"{"text": "hello there"}"#).unwrap();
        assert_eq!(parsed.into_text(), "hello there");
    }

    #[test]
    fn test_plain_shape_parses() {
        let parsed: EngineTranscript = serde_json::from_str(r#""hello there""#).unwrap();
        assert_eq!(parsed.into_text(), "hello there");
    }

    #[test]
    fn test_missing_text_normalizes_to_empty() {
        let parsed: EngineTranscript = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(parsed.into_text(), "");
    }
}
