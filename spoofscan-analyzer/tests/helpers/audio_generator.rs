//! Audio Test Fixture Generator
//!
//! Builds in-memory WAV payloads for pipeline tests

use std::io::Cursor;

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct WavConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Peak amplitude of the tone, 0.0 gives digital silence
    pub amplitude: f32,
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            sample_rate: 16_000,
            channels: 1,
            amplitude: 0.3,
        }
    }
}

/// Generate a 16-bit PCM WAV with a 440 Hz tone on every channel
pub fn generate_wav_bytes(config: &WavConfig) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

        for i in 0..total_samples {
            let t = i as f32 / config.sample_rate as f32;
            let sample = (config.amplitude
                * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                * i16::MAX as f32) as i16;
            for _ in 0..config.channels {
                writer.write_sample(sample)?;
            }
        }

        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
