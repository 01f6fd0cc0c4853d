//! # Response Orchestration
//!
//! Invokes the response-generation capability with the transcript and the
//! conversation's prior history, mapping any failure into the pipeline
//! taxonomy. No automatic retry: by the time this runs the user message is
//! already durably stored, and the partial-failure policy leaves it in place.

use crate::conversation::Message;
use crate::error::{VoiceError, VoiceResult};
use crate::generation::engine::ResponseGenerator;
use std::sync::Arc;
use tracing::{debug, error};

pub struct ResponseOrchestrator {
    generator: Arc<dyn ResponseGenerator>,
}

impl ResponseOrchestrator {
    pub fn new(generator: Arc<dyn ResponseGenerator>) -> Self {
        Self { generator }
    }

    /// Generate the assistant's reply to `transcript`.
    ///
    /// `history` is passed to the capability exactly as the resolver
    /// produced it: prior turns only, not the just-appended user message.
    pub async fn generate(&self, transcript: &str, history: &[Message]) -> VoiceResult<String> {
        let reply = self
            .generator
            .generate(transcript, history)
            .await
            .map_err(|e| {
                error!(error = %e, "response generation failed");
                VoiceError::ResponseGeneration(e.to_string())
            })?;

        debug!(reply_chars = reply.len(), "generated assistant reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct CannedGenerator {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl ResponseGenerator for CannedGenerator {
        async fn generate(&self, _text: &str, _history: &[Message]) -> anyhow::Result<String> {
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(anyhow!("{}", message)),
            }
        }
    }

    #[tokio::test]
    async fn test_reply_is_returned_verbatim() {
        let orchestrator = ResponseOrchestrator::new(Arc::new(CannedGenerator {
            reply: Ok("  Sure thing!  ".to_string()),
        }));
        let reply = orchestrator.generate("turn on the lights", &[]).await.unwrap();
        // no trimming contract at this layer
        assert_eq!(reply, "  Sure thing!  ");
    }

    #[tokio::test]
    async fn test_failure_maps_to_response_generation() {
        let orchestrator = ResponseOrchestrator::new(Arc::new(CannedGenerator {
            reply: Err("model overloaded".to_string()),
        }));
        let err = orchestrator.generate("hello", &[]).await.unwrap_err();
        assert!(matches!(err, VoiceError::ResponseGeneration(_)));
        assert!(err.to_string().contains("model overloaded"));
    }
}
