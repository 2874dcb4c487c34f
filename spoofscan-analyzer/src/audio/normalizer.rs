//! Audio Normalizer
//!
//! Decodes arbitrary container bytes to a mono waveform at the pipeline's
//! target sample rate.
//!
//! **Algorithm:**
//! 1. For each codec hint in order, probe the bytes with a registry holding only
//!    that hint's container reader
//! 2. Decode every packet of the first audio track, averaging channels to mono
//! 3. First hint that decodes wins; if none does, report every hint's failure
//! 4. Resample to the target rate if the source rate differs
//! 5. Reject zero-length or entirely silent results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use symphonia::default::formats::{
    AdtsReader, FlacReader, IsoMp4Reader, MkvReader, MpaReader, OggReader, WavReader,
};
use tracing::{debug, warn};

use super::resampler::Resampler;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Waveform;

/// Container/codec hint tried by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecHint {
    Wav,
    Flac,
    Mp3,
    Ogg,
    Mp4,
    Mkv,
    Aac,
}

impl CodecHint {
    /// Default order: lossless/PCM containers first, then compressed formats
    pub const DEFAULT_ORDER: [CodecHint; 7] = [
        CodecHint::Wav,
        CodecHint::Flac,
        CodecHint::Mp3,
        CodecHint::Ogg,
        CodecHint::Mp4,
        CodecHint::Mkv,
        CodecHint::Aac,
    ];

    /// File extension passed to the probe as a hint
    pub fn extension(&self) -> &'static str {
        match self {
            CodecHint::Wav => "wav",
            CodecHint::Flac => "flac",
            CodecHint::Mp3 => "mp3",
            CodecHint::Ogg => "ogg",
            CodecHint::Mp4 => "mp4",
            CodecHint::Mkv => "mkv",
            CodecHint::Aac => "aac",
        }
    }

    /// Probe that recognizes only this hint's container
    fn probe(&self) -> Probe {
        let mut probe = Probe::default();
        match self {
            CodecHint::Wav => probe.register_all::<WavReader>(),
            CodecHint::Flac => probe.register_all::<FlacReader>(),
            CodecHint::Mp3 => probe.register_all::<MpaReader>(),
            CodecHint::Ogg => probe.register_all::<OggReader>(),
            CodecHint::Mp4 => probe.register_all::<IsoMp4Reader>(),
            CodecHint::Mkv => probe.register_all::<MkvReader>(),
            CodecHint::Aac => probe.register_all::<AdtsReader>(),
        }
        probe
    }
}

impl fmt::Display for CodecHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for CodecHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodecHint::DEFAULT_ORDER
            .iter()
            .copied()
            .find(|hint| hint.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown codec hint '{}'", s))
    }
}

/// Mono audio decoded at the source sample rate
#[derive(Debug)]
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

/// Decodes and normalizes raw audio bytes
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    target_sample_rate: u32,
    hints: Vec<CodecHint>,
}

impl AudioNormalizer {
    pub fn new(target_sample_rate: u32, hints: Vec<CodecHint>) -> Self {
        Self {
            target_sample_rate,
            hints,
        }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn hints(&self) -> &[CodecHint] {
        &self.hints
    }

    /// Decode `bytes` into a mono waveform at the target sample rate
    ///
    /// # Errors
    /// * `UnsupportedFormat` - no hint decoded; the message lists every attempt
    /// * `EmptyAudio` - decoded audio is zero-length or silent
    /// * `Internal` - resampling failed
    pub fn normalize(&self, bytes: &[u8]) -> AnalysisResult<Waveform> {
        let mut failures = Vec::with_capacity(self.hints.len());

        let decoded = self.hints.iter().find_map(|hint| {
            match decode_with_hint(*hint, bytes) {
                Ok(decoded) => {
                    debug!(
                        hint = %hint,
                        sample_rate = decoded.sample_rate,
                        channels = decoded.channels,
                        samples = decoded.samples.len(),
                        "Audio decoded"
                    );
                    Some(decoded)
                }
                Err(reason) => {
                    debug!(hint = %hint, reason = %reason, "Codec hint rejected");
                    failures.push(format!("{}: {}", hint, reason));
                    None
                }
            }
        });

        let Some(decoded) = decoded else {
            let detail = if failures.is_empty() {
                "no codec hints configured".to_string()
            } else {
                failures.join("; ")
            };
            return Err(AnalysisError::UnsupportedFormat(detail));
        };

        let samples = Resampler::resample_mono(
            &decoded.samples,
            decoded.sample_rate,
            self.target_sample_rate,
        )
        .map_err(AnalysisError::Internal)?;

        if samples.is_empty() {
            return Err(AnalysisError::EmptyAudio(
                "Audio contains no samples after decoding".to_string(),
            ));
        }
        if samples.iter().all(|s| *s == 0.0) {
            return Err(AnalysisError::EmptyAudio(
                "Audio is entirely silent after decoding".to_string(),
            ));
        }

        Ok(Waveform::new(samples, self.target_sample_rate))
    }
}

/// Decode the first audio track using only `hint`'s container reader
fn decode_with_hint(hint: CodecHint, bytes: &[u8]) -> Result<DecodedAudio, String> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut probe_hint = Hint::new();
    probe_hint.with_extension(hint.extension());

    let probed = hint
        .probe()
        .format(
            &probe_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("probe failed: {}", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "no audio track found".to_string())?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| "sample rate unknown".to_string())?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("no decoder: {}", e))?;

    let mut samples = Vec::new();
    let mut channels = 0;
    let mut decoded_packets = 0usize;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(format!("error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                channels = decoded.spec().channels.count();
                mix_to_mono(decoded, &mut samples);
                decoded_packets += 1;
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupt packet: skip it and keep going
                skipped_packets += 1;
                warn!(hint = %hint, error = %msg, "Skipping undecodable packet");
            }
            Err(e) => return Err(format!("decode failed: {}", e)),
        }
    }

    if decoded_packets == 0 && skipped_packets > 0 {
        return Err(format!("all {} packets failed to decode", skipped_packets));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Append a decoded buffer to `out`, averaging all channels into one
fn mix_to_mono(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    if channels == 0 {
        return;
    }

    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    buffer.copy_interleaved_ref(decoded);

    out.extend(
        buffer
            .samples()
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
