//! # Application State Management
//!
//! Shared state accessed by every HTTP request handler and WebSocket
//! session. Follows the Arc<RwLock<T>> pattern throughout: many concurrent
//! readers, one writer, no data races.
//!
//! The external collaborators (durable store, speech engine, response
//! generator) are injected at construction rather than reached through
//! globals, so the whole request path can run against substitutable fakes
//! in tests.

use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::events::MessageBroadcaster;
use crate::generation::ResponseGenerator;
use crate::pipeline::VoicePipeline;
use crate::transcription::SpeechToText;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// State shared across all request handlers.
///
/// Cloning is cheap: every field is either `Copy` or an `Arc` handle onto
/// the same underlying data.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (can be updated at runtime).
    pub config: Arc<RwLock<AppConfig>>,

    /// Service counters, updated by middleware and handlers.
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// When the server started. Never changes, so no lock needed.
    pub start_time: Instant,

    /// Durable conversation store, shared with the pipeline.
    pub store: Arc<dyn ConversationStore>,

    /// The end-to-end voice turn pipeline.
    pub pipeline: Arc<VoicePipeline>,

    /// Fan-out channel feeding live WebSocket viewers.
    pub events: MessageBroadcaster,
}

/// Service-level counters.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total HTTP requests processed since startup.
    pub request_count: u64,

    /// Total requests that ended in an error response.
    pub error_count: u64,

    /// Completed voice turns (audio in, reply out).
    pub voice_turns: u64,

    /// Completed text chat turns.
    pub chat_turns: u64,
}

impl AppState {
    /// Wire up shared state from configuration and the three injected
    /// collaborators.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ConversationStore>,
        speech: Arc<dyn SpeechToText>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        let events = MessageBroadcaster::new();
        let pipeline = Arc::new(VoicePipeline::new(
            store.clone(),
            speech,
            generator,
            events.clone(),
            &config.voice,
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
            store,
            pipeline,
            events,
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the read lock immediately so other requests are
    /// never blocked on response serialization.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    /// Replace the configuration after validating it.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap() = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn increment_request_count(&self) {
        self.metrics.write().unwrap().request_count += 1;
    }

    pub fn increment_error_count(&self) {
        self.metrics.write().unwrap().error_count += 1;
    }

    /// Record one completed voice turn (called after the pipeline succeeds).
    pub fn record_voice_turn(&self) {
        self.metrics.write().unwrap().voice_turns += 1;
    }

    /// Record one completed text chat turn.
    pub fn record_chat_turn(&self) {
        self.metrics.write().unwrap().chat_turns += 1;
    }

    /// Snapshot of the counters for the health endpoint.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
