//! Segmenter
//!
//! Splits a waveform into non-overlapping frames of exactly `frame_len`
//! samples. The last frame is zero-padded on its trailing edge.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{Frame, FrameSpan, Waveform};

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    frame_len: usize,
}

impl Segmenter {
    /// Create a segmenter producing frames of `frame_len` samples
    pub fn new(frame_len: usize) -> Self {
        Self { frame_len }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Number of frames a waveform of `total_samples` produces
    pub fn frame_count(&self, total_samples: usize) -> usize {
        if self.frame_len == 0 {
            return 0;
        }
        (total_samples + self.frame_len - 1) / self.frame_len
    }

    /// Split `waveform` into frames
    ///
    /// # Errors
    /// * `EmptyAudio` - the waveform has no samples
    /// * `SizeMismatch` - a produced frame does not hold exactly `frame_len` samples
    pub fn segment(&self, waveform: &Waveform) -> AnalysisResult<Vec<Frame>> {
        if self.frame_len == 0 {
            return Err(AnalysisError::Internal(
                "Frame length must be positive".to_string(),
            ));
        }
        if waveform.is_empty() {
            return Err(AnalysisError::EmptyAudio(
                "Waveform has no samples to segment".to_string(),
            ));
        }

        let frames = waveform
            .samples
            .chunks(self.frame_len)
            .enumerate()
            .map(|(index, chunk)| {
                let padding = self.frame_len - chunk.len();
                let mut samples = Vec::with_capacity(self.frame_len);
                samples.extend_from_slice(chunk);
                samples.resize(self.frame_len, 0.0);

                let frame = Frame {
                    span: FrameSpan::new(index, self.frame_len, waveform.sample_rate),
                    samples,
                    padding,
                };
                self.check_frame(&frame)?;
                Ok(frame)
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        tracing::debug!(
            total_samples = waveform.len(),
            frame_len = self.frame_len,
            frames = frames.len(),
            "Waveform segmented"
        );

        Ok(frames)
    }

    fn check_frame(&self, frame: &Frame) -> AnalysisResult<()> {
        if frame.sample_count() != self.frame_len {
            return Err(AnalysisError::SizeMismatch(format!(
                "Frame {} has {} samples, expected {}",
                frame.index(),
                frame.sample_count(),
                self.frame_len
            )));
        }
        Ok(())
    }
}
