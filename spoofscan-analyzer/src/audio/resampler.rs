//! Mono resampling using rubato
//!
//! Converts decoded audio to the pipeline's target sample rate.

use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Audio resampler using rubato for sample rate conversion
pub struct Resampler;

impl Resampler {
    /// Resample mono audio from `input_rate` to `output_rate`
    ///
    /// Returns a copy when the rates already match.
    pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, String> {
        if input_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input.to_vec());
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }
        if input_rate == 0 {
            return Err("Source sample rate is zero".to_string());
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

        // Single pass: chunk size equals the whole input
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input.len(),
            1,
        )
        .map_err(|e| format!("Failed to create resampler: {}", e))?;

        let mut output = resampler
            .process(&[input], None)
            .map_err(|e| format!("Resampling failed: {}", e))?;

        let samples = output.pop().unwrap_or_default();

        debug!(
            "Resampled {} input samples to {} output samples",
            input.len(),
            samples.len()
        );

        Ok(samples)
    }
}
