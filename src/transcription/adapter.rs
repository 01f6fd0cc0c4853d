//! # Transcription Adapter
//!
//! Sits between the pipeline and the speech-to-text engine. Frames the raw
//! audio, stages it as a temporary file (the engine's input contract), runs
//! the engine, and normalizes the result to trimmed text.
//!
//! ## Cleanup Guarantee:
//! The staged file is deleted on every exit path, success or failure, before
//! control returns to the pipeline. Deletion is best-effort: a cleanup
//! failure is logged and swallowed, never re-raised over the transcription
//! outcome.

use crate::audio::{frame, DeclaredFormat, PcmSpec};
use crate::error::{VoiceError, VoiceResult};
use crate::transcription::engine::SpeechToText;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Deletes the staged audio file when the transcription call unwinds,
/// whichever way it unwinds.
struct StagedAudio {
    path: PathBuf,
}

impl StagedAudio {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedAudio {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e,
                "failed to remove staged audio file");
        }
    }
}

/// Frames, stages, and transcribes one audio clip.
pub struct TranscriptionAdapter {
    engine: Arc<dyn SpeechToText>,
    pcm_spec: PcmSpec,
}

impl TranscriptionAdapter {
    pub fn new(engine: Arc<dyn SpeechToText>, pcm_spec: PcmSpec) -> Self {
        Self { engine, pcm_spec }
    }

    /// Transcribe `audio` to trimmed text.
    ///
    /// An empty string is a *successful* return here; the pipeline
    /// controller decides whether that constitutes an empty-transcript
    /// failure. Engine failures (including failing to stage the file the
    /// engine consumes) map to `TranscriptionEngine`.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        format: &DeclaredFormat,
    ) -> VoiceResult<String> {
        let framed = frame(audio, format, &self.pcm_spec);

        let staged = StagedAudio {
            path: std::env::temp_dir().join(format!(
                "voice-turn-{}.{}",
                Uuid::new_v4(),
                format.file_extension()
            )),
        };

        tokio::fs::write(staged.path(), &framed).await.map_err(|e| {
            error!(path = %staged.path().display(), error = %e,
                "failed to stage audio for transcription");
            VoiceError::TranscriptionEngine(format!("failed to stage audio: {}", e))
        })?;

        debug!(path = %staged.path().display(), bytes = framed.len(), "staged framed audio");

        let result = self.engine.transcribe_file(staged.path()).await;
        // `staged` drops here on both arms, removing the file.
        match result {
            Ok(transcript) => Ok(transcript.into_text().trim().to_string()),
            Err(e) => {
                error!(error = %e, "transcription engine failed");
                Err(VoiceError::TranscriptionEngine(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WAV_HEADER_LEN;
    use crate::transcription::engine::EngineTranscript;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Engine double that records what it was handed and replies with a
    /// canned result.
    struct RecordingEngine {
        reply: Result<EngineTranscript, String>,
        seen_path: Mutex<Option<PathBuf>>,
        seen_bytes: Mutex<Vec<u8>>,
    }

    impl RecordingEngine {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(EngineTranscript::Structured {
                    text: Some(text.to_string()),
                }),
                seen_path: Mutex::new(None),
                seen_bytes: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen_path: Mutex::new(None),
                seen_bytes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for RecordingEngine {
        async fn transcribe_file(&self, audio_path: &Path) -> anyhow::Result<EngineTranscript> {
            *self.seen_path.lock().unwrap() = Some(audio_path.to_path_buf());
            *self.seen_bytes.lock().unwrap() = std::fs::read(audio_path)?;
            match &self.reply {
                Ok(transcript) => Ok(transcript.clone()),
                Err(message) => Err(anyhow!("{}", message)),
            }
        }
    }

    fn adapter_with(engine: Arc<RecordingEngine>) -> TranscriptionAdapter {
        TranscriptionAdapter::new(engine, PcmSpec::default())
    }

    #[tokio::test]
    async fn test_stages_framed_audio_and_trims_result() {
        let engine = Arc::new(RecordingEngine::replying("  turn on the lights  "));
        let adapter = adapter_with(engine.clone());

        let pcm = vec![0u8; 320];
        let text = adapter
            .transcribe(&pcm, &DeclaredFormat::RawPcm)
            .await
            .unwrap();
        assert_eq!(text, "turn on the lights");

        // the engine saw a WAV container wrapping the original samples
        let staged = engine.seen_bytes.lock().unwrap().clone();
        assert_eq!(staged.len(), WAV_HEADER_LEN + pcm.len());
        assert_eq!(&staged[0..4], b"RIFF");
        assert_eq!(&staged[WAV_HEADER_LEN..], &pcm[..]);
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_success() {
        let engine = Arc::new(RecordingEngine::replying("hello"));
        let adapter = adapter_with(engine.clone());

        adapter
            .transcribe(&[0u8; 32], &DeclaredFormat::RawPcm)
            .await
            .unwrap();

        let path = engine.seen_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists(), "staged file should be cleaned up");
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_engine_failure() {
        let engine = Arc::new(RecordingEngine::failing("quota exceeded"));
        let adapter = adapter_with(engine.clone());

        let err = adapter
            .transcribe(&[0u8; 32], &DeclaredFormat::RawPcm)
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::TranscriptionEngine(_)));
        assert!(err.to_string().contains("quota exceeded"));

        let path = engine.seen_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists(), "staged file should be cleaned up on failure");
    }

    #[tokio::test]
    async fn test_whitespace_only_result_is_successful_empty() {
        let engine = Arc::new(RecordingEngine::replying("   "));
        let adapter = adapter_with(engine);

        let text = adapter
            .transcribe(&[0u8; 32], &DeclaredFormat::RawPcm)
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_container_format_is_not_reframed() {
        let engine = Arc::new(RecordingEngine::replying("ok"));
        let adapter = adapter_with(engine.clone());

        let wav_bytes = b"RIFFalready-framed".to_vec();
        adapter
            .transcribe(&wav_bytes, &DeclaredFormat::from_tag("wav"))
            .await
            .unwrap();

        let staged = engine.seen_bytes.lock().unwrap().clone();
        assert_eq!(staged, wav_bytes);
    }
}
