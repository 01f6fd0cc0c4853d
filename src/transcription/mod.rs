//! # Transcription Module
//!
//! Speech-to-text for the voice pipeline. The engine itself is an external
//! capability reached over HTTP; this module owns the boundary around it:
//!
//! ## Key Components:
//! - **Engine trait**: The capability contract (audio file in, text out)
//! - **Whisper API client**: Hosted Whisper implementation of the trait
//! - **Adapter**: Frames raw audio, stages it as a temporary file, invokes
//!   the engine, normalizes the result shape, and guarantees the temporary
//!   artifact is deleted on every exit path

pub mod adapter;
pub mod engine;
pub mod whisper_api;

pub use adapter::TranscriptionAdapter;
pub use engine::{EngineTranscript, SpeechToText};
pub use whisper_api::WhisperApiEngine;
