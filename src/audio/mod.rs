//! # Audio Module
//!
//! Handles the device-facing side of the voice pipeline: turning the raw PCM
//! byte stream a microcontroller posts into framed audio the transcription
//! engine can decode.
//!
//! ## Audio Format Assumptions:
//! - **Sample Rate**: 16kHz (16,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers
//!
//! Callers may declare a different, already-containerized format; such
//! payloads skip framing entirely.

pub mod framer;

pub use framer::{frame, DeclaredFormat, PcmSpec, WAV_HEADER_LEN};
