//! # Response Generation Module
//!
//! Produces the assistant's conversational reply to a transcribed utterance.
//! Like transcription, the generator itself is an external capability; this
//! module owns the trait boundary, the hosted chat-completions client, and
//! the thin orchestrator that maps failures into the pipeline taxonomy.

pub mod chat_api;
pub mod engine;
pub mod orchestrator;

pub use chat_api::ChatApiEngine;
pub use engine::ResponseGenerator;
pub use orchestrator::ResponseOrchestrator;
