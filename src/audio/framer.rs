//! # Audio Framing
//!
//! Wraps raw linear PCM from the device in a minimal RIFF/WAVE container so the
//! transcription engine can validate and decode it without external metadata.
//!
//! ## Container Layout:
//! A fixed 44-byte header followed by the unmodified sample data:
//! - **RIFF chunk**: `RIFF` tag, remaining file size, `WAVE` tag
//! - **fmt chunk**: `fmt ` tag, block size (16), PCM format code (1), channel
//!   count, sample rate, byte rate, block alignment, bits per sample
//! - **data chunk**: `data` tag, payload length in bytes
//!
//! All multi-byte integer fields are little-endian. Framing is unconditional:
//! it never fails for well-formed inputs, and an empty payload still produces
//! a structurally valid (if useless) container. Input validation such as size
//! limits happens upstream in the pipeline controller.

use byteorder::{LittleEndian, WriteBytesExt};

/// Size of the RIFF/WAVE header prepended to raw PCM payloads.
pub const WAV_HEADER_LEN: usize = 44;

/// Audio format declared by the caller alongside the raw bytes.
///
/// Devices normally send bare PCM samples (`pcm16-mono-16k`), which need
/// framing before any engine can decode them. Anything else is treated as an
/// opaque, already self-describing container and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredFormat {
    /// Raw linear PCM samples with no container header.
    RawPcm,
    /// A self-describing container (e.g. "wav", "ogg"); no re-framing.
    Container(String),
}

impl DeclaredFormat {
    /// Parse a caller-supplied format tag.
    ///
    /// `pcm` and `pcm16-mono-16k` both mean raw samples; any other tag names
    /// a container format that is forwarded as-is.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "pcm" | "pcm16-mono-16k" => DeclaredFormat::RawPcm,
            other => DeclaredFormat::Container(other.to_string()),
        }
    }

    /// File extension used when the framed audio is written to disk for the
    /// transcription engine.
    pub fn file_extension(&self) -> &str {
        match self {
            DeclaredFormat::RawPcm => "wav",
            DeclaredFormat::Container(tag) => tag.as_str(),
        }
    }
}

/// Sample layout of the raw PCM the device records.
///
/// The header fields derived from these values (byte rate, block alignment)
/// are computed, never stored, so the container is internally consistent by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmSpec {
    fn default() -> Self {
        // 16-bit signed little-endian, mono, 16 kHz: the device's mic format.
        Self {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl PcmSpec {
    /// Bytes consumed per second of audio (sample rate x channels x bytes per sample).
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }
}

/// Frame audio bytes for the transcription engine.
///
/// Raw PCM gains a WAV header; declared container formats pass through
/// unmodified. The input bytes are never altered, only prefixed.
pub fn frame(bytes: &[u8], format: &DeclaredFormat, spec: &PcmSpec) -> Vec<u8> {
    match format {
        DeclaredFormat::RawPcm => {
            let mut framed = Vec::with_capacity(WAV_HEADER_LEN + bytes.len());
            write_wav_header(&mut framed, spec, bytes.len() as u32);
            framed.extend_from_slice(bytes);
            framed
        }
        DeclaredFormat::Container(_) => bytes.to_vec(),
    }
}

/// Write the 44-byte RIFF/WAVE header for a PCM payload of `data_len` bytes.
fn write_wav_header(out: &mut Vec<u8>, spec: &PcmSpec, data_len: u32) {
    // RIFF chunk: tag, remaining size (everything after these first 8 bytes), WAVE tag
    out.extend_from_slice(b"RIFF");
    out.write_u32::<LittleEndian>(36 + data_len)
        .expect("writing to a Vec cannot fail");
    out.extend_from_slice(b"WAVE");

    // fmt chunk: 16-byte block describing the sample layout
    out.extend_from_slice(b"fmt ");
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap(); // format code 1 = linear PCM
    out.write_u16::<LittleEndian>(spec.channels).unwrap();
    out.write_u32::<LittleEndian>(spec.sample_rate).unwrap();
    out.write_u32::<LittleEndian>(spec.byte_rate()).unwrap();
    out.write_u16::<LittleEndian>(spec.block_align()).unwrap();
    out.write_u16::<LittleEndian>(spec.bits_per_sample).unwrap();

    // data chunk: tag plus payload length, samples follow immediately
    out.extend_from_slice(b"data");
    out.write_u32::<LittleEndian>(data_len).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::Cursor;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        Cursor::new(&buf[offset..offset + 4])
            .read_u32::<LittleEndian>()
            .unwrap()
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        Cursor::new(&buf[offset..offset + 2])
            .read_u16::<LittleEndian>()
            .unwrap()
    }

    #[test]
    fn test_header_fields_for_default_spec() {
        let pcm: Vec<u8> = (0..160u16).flat_map(|s| s.to_le_bytes()).collect();
        let framed = frame(&pcm, &DeclaredFormat::RawPcm, &PcmSpec::default());

        assert_eq!(framed.len(), WAV_HEADER_LEN + pcm.len());
        assert_eq!(&framed[0..4], b"RIFF");
        assert_eq!(u32_at(&framed, 4), 36 + pcm.len() as u32);
        assert_eq!(&framed[8..12], b"WAVE");
        assert_eq!(&framed[12..16], b"fmt ");
        assert_eq!(u32_at(&framed, 16), 16);
        assert_eq!(u16_at(&framed, 20), 1); // PCM format code
        assert_eq!(u16_at(&framed, 22), 1); // mono
        assert_eq!(u32_at(&framed, 24), 16_000);
        assert_eq!(u32_at(&framed, 28), 32_000); // 16000 * 1 * 2
        assert_eq!(u16_at(&framed, 32), 2); // block align
        assert_eq!(u16_at(&framed, 34), 16); // bits per sample
        assert_eq!(&framed[36..40], b"data");
        assert_eq!(u32_at(&framed, 40), pcm.len() as u32);
    }

    #[test]
    fn test_framing_is_lossless() {
        let pcm = vec![0x01u8, 0x02, 0x03, 0x04, 0xFF, 0x7F];
        let framed = frame(&pcm, &DeclaredFormat::RawPcm, &PcmSpec::default());
        assert_eq!(&framed[WAV_HEADER_LEN..], &pcm[..]);
    }

    #[test]
    fn test_empty_payload_still_frames() {
        let framed = frame(&[], &DeclaredFormat::RawPcm, &PcmSpec::default());
        assert_eq!(framed.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&framed, 40), 0);
    }

    #[test]
    fn test_container_format_passes_through() {
        let bytes = b"OggS not really audio".to_vec();
        let format = DeclaredFormat::from_tag("ogg");
        assert_eq!(frame(&bytes, &format, &PcmSpec::default()), bytes);
    }

    #[test]
    fn test_format_tag_parsing() {
        assert_eq!(DeclaredFormat::from_tag("pcm"), DeclaredFormat::RawPcm);
        assert_eq!(
            DeclaredFormat::from_tag("pcm16-mono-16k"),
            DeclaredFormat::RawPcm
        );
        assert_eq!(
            DeclaredFormat::from_tag("wav"),
            DeclaredFormat::Container("wav".to_string())
        );
        assert_eq!(DeclaredFormat::from_tag("wav").file_extension(), "wav");
        assert_eq!(DeclaredFormat::RawPcm.file_extension(), "wav");
    }

    #[test]
    fn test_byte_rate_and_block_align_derivation() {
        let spec = PcmSpec {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
        };
        assert_eq!(spec.byte_rate(), 176_400);
        assert_eq!(spec.block_align(), 4);
    }
}
