//! # Voice Chat Backend - Main Application Entry Point
//!
//! HTTP server for a microcontroller-driven voice assistant. The device
//! posts raw PCM audio; the server transcribes it, generates a reply,
//! persists the exchange as conversation history, and broadcasts both new
//! messages to live WebSocket viewers.
//!
//! ## Application Architecture:
//! - **config**: Configuration (TOML file + environment variables)
//! - **state**: Shared application state, counters, injected collaborators
//! - **error**: The voice pipeline failure taxonomy and HTTP mapping
//! - **audio**: PCM framing for the transcription engine
//! - **transcription / generation**: The two hosted engine boundaries
//! - **conversation**: Durable history, resolution, and sequencing
//! - **pipeline**: The end-to-end voice turn
//! - **events / websocket**: Live fan-out to viewers
//! - **handlers / health / middleware**: The HTTP surface

mod audio;
mod config;
mod conversation;
mod error;
mod events;
mod generation;
mod handlers;
mod health;
mod middleware;
mod pipeline;
mod state;
mod transcription;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware::Logger};
use anyhow::Result;
use config::AppConfig;
use conversation::MemoryStore;
use generation::ChatApiEngine;
use state::AppState;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcription::WhisperApiEngine;

/// Transport-level request body cap. Sits above the pipeline's own 320,000
/// byte clip limit so oversized clips reach the pipeline and get the typed
/// `audio_too_large` answer instead of a bare transport rejection.
const MAX_BODY_BYTES: usize = 512 * 1024;

/// Global shutdown signal, set by the signal handler task and polled by the
/// main task.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present; its absence is fine.
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting voice-chat-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    // The engine API key is a secret and never part of AppConfig.
    let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; engine calls will fail until it is provided");
    }

    // Wire the injected collaborators: the in-process store and the two
    // hosted engine clients.
    let store = Arc::new(MemoryStore::new());
    let speech = Arc::new(WhisperApiEngine::new(
        &config.engines.api_base,
        &api_key,
        &config.engines.transcription_model,
    )?);
    let generator = Arc::new(ChatApiEngine::new(
        &config.engines.api_base,
        &api_key,
        &config.engines.chat_model,
        &config.engines.persona_prompt,
    )?);

    let app_state = AppState::new(config.clone(), store, speech, generator);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);
    info!("Voice endpoint: POST /api/voice/input");

    let server = HttpServer::new(move || {
        // Embedded clients and the browser UI connect from arbitrary LAN
        // addresses, so CORS stays permissive.
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(middleware::RequestLogging)
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health::health_check))
                    .route("/voice/input", web::post().to(handlers::voice_input))
                    .route("/chat/message", web::post().to(handlers::post_message))
                    .route("/conversations", web::get().to(handlers::list_conversations))
                    .route("/conversations/{id}", web::get().to(handlers::get_conversation))
                    .route("/conversations/{id}", web::delete().to(handlers::delete_conversation))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config))
            )
            // Health at root level too, for load balancers and probes
            .route("/health", web::get().to(health::health_check))
            .route("/ws/conversations", web::get().to(websocket::conversation_feed))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    // Run until the server dies on its own or a shutdown signal arrives,
    // whichever happens first.
    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize structured logging. `RUST_LOG` controls the filter; the
/// default keeps this crate at debug and the framework at info.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_chat_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Listen for SIGTERM/SIGINT in a background task and flip the global
/// shutdown flag so in-flight requests can finish before the server stops.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag without busy-waiting.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
