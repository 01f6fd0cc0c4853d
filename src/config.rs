//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration file (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER_HOST, APP_SERVER_PORT, ...)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! The engine API key is deliberately NOT part of this struct: it is a
//! secret, and AppConfig is echoed back by the configuration endpoint. The
//! key is read from the environment at startup (see main.rs).

use crate::audio::PcmSpec;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engines: EnginesConfig,
    pub voice: VoiceConfig,
}

/// Server-specific configuration settings.
///
/// ## Fields:
/// - `host`: Address to bind; defaults to all interfaces so the
///   microcontroller can reach the service over the LAN
/// - `port`: TCP port to listen on
/// - `environment`: `development` or `production`; controls whether error
///   responses include collaborator diagnostic detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

/// Hosted engine settings for the two external capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginesConfig {
    /// Base URL shared by the transcription and chat endpoints.
    pub api_base: String,
    /// Transcription model name (e.g. "whisper-1").
    pub transcription_model: String,
    /// Chat model name used for reply generation.
    pub chat_model: String,
    /// System prompt establishing the assistant's persona.
    pub persona_prompt: String,
}

/// Limits and layout of the audio clips devices post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Maximum accepted clip size in bytes. The default is roughly 10
    /// seconds of 16kHz 16-bit mono PCM.
    pub max_audio_bytes: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl VoiceConfig {
    /// Sample layout used when framing raw PCM from the device.
    pub fn pcm_spec(&self) -> PcmSpec {
        PcmSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                // All interfaces: embedded clients connect over the LAN.
                host: "0.0.0.0".to_string(),
                port: 3001,
                environment: "development".to_string(),
            },
            engines: EnginesConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                transcription_model: "whisper-1".to_string(),
                chat_model: "gpt-4o-mini".to_string(),
                persona_prompt: "You are a cheerful, curious little robot companion. \
                    Keep replies short, warm, and helpful; you are speaking to someone \
                    through a small handheld device."
                    .to_string(),
            },
            voice: VoiceConfig {
                max_audio_bytes: 320_000,
                sample_rate: 16_000,
                channels: 1,
                bits_per_sample: 16,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER_PORT=8080`: override the listen port
    /// - `APP_ENGINES_CHAT_MODEL=gpt-4o`: override the chat model
    /// - `HOST` / `PORT`: deployment-platform overrides without the prefix
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Deployment platforms commonly inject these without the APP_ prefix.
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if !matches!(self.server.environment.as_str(), "development" | "production") {
            return Err(anyhow::anyhow!(
                "Environment must be 'development' or 'production', got '{}'",
                self.server.environment
            ));
        }

        if self.voice.max_audio_bytes == 0 {
            return Err(anyhow::anyhow!("Max audio bytes must be greater than 0"));
        }

        if self.voice.sample_rate == 0 || self.voice.channels == 0 {
            return Err(anyhow::anyhow!("Sample rate and channel count must be non-zero"));
        }

        if self.voice.bits_per_sample == 0 || self.voice.bits_per_sample % 8 != 0 {
            return Err(anyhow::anyhow!(
                "Bits per sample must be a non-zero multiple of 8"
            ));
        }

        if self.engines.api_base.is_empty() {
            return Err(anyhow::anyhow!("Engine API base URL cannot be empty"));
        }

        Ok(())
    }

    /// Apply a partial update from a JSON document, then re-validate.
    ///
    /// Only the fields present in the JSON change; everything else keeps its
    /// current value. For example `{"server": {"port": 9000}}` changes only
    /// the port.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial: serde_json::Value = serde_json::from_str(json_str)?;

        if let Some(server) = partial.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = port as u16;
            }
            if let Some(environment) = server.get("environment").and_then(|v| v.as_str()) {
                self.server.environment = environment.to_string();
            }
        }

        if let Some(engines) = partial.get("engines") {
            if let Some(api_base) = engines.get("api_base").and_then(|v| v.as_str()) {
                self.engines.api_base = api_base.to_string();
            }
            if let Some(model) = engines.get("transcription_model").and_then(|v| v.as_str()) {
                self.engines.transcription_model = model.to_string();
            }
            if let Some(model) = engines.get("chat_model").and_then(|v| v.as_str()) {
                self.engines.chat_model = model.to_string();
            }
            if let Some(prompt) = engines.get("persona_prompt").and_then(|v| v.as_str()) {
                self.engines.persona_prompt = prompt.to_string();
            }
        }

        if let Some(voice) = partial.get("voice") {
            if let Some(max) = voice.get("max_audio_bytes").and_then(|v| v.as_u64()) {
                self.voice.max_audio_bytes = max as usize;
            }
            if let Some(rate) = voice.get("sample_rate").and_then(|v| v.as_u64()) {
                self.voice.sample_rate = rate as u32;
            }
            if let Some(channels) = voice.get("channels").and_then(|v| v.as_u64()) {
                self.voice.channels = channels as u16;
            }
            if let Some(bits) = voice.get("bits_per_sample").and_then(|v| v.as_u64()) {
                self.voice.bits_per_sample = bits as u16;
            }
        }

        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.voice.max_audio_bytes, 320_000);
        assert_eq!(config.voice.sample_rate, 16_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pcm_spec_from_voice_config() {
        let spec = AppConfig::default().voice.pcm_spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.environment = "staging".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.voice.bits_per_sample = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_update() {
        let mut config = AppConfig::default();
        let json = r#"{"voice": {"max_audio_bytes": 640000}, "engines": {"chat_model": "gpt-4o"}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.voice.max_audio_bytes, 640_000);
        assert_eq!(config.engines.chat_model, "gpt-4o");
        // untouched fields keep their values
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_partial_update_still_validates() {
        let mut config = AppConfig::default();
        assert!(config
            .update_from_json(r#"{"voice": {"max_audio_bytes": 0}}"#)
            .is_err());
    }
}
