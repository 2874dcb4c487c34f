//! Core data model for the analysis pipeline
//!
//! Request and response types plus the per-frame records exchanged between
//! the segmenter, the scoring dispatcher, and the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Inbound analysis request
///
/// Both fields are mandatory. They are `Option` so that a missing field is
/// reported as an `InvalidArgument` with a readable message rather than a
/// generic deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisRequest {
    pub bucket: Option<String>,
    pub object_key: Option<String>,
}

impl AnalysisRequest {
    pub fn new(bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            object_key: Some(object_key.into()),
        }
    }
}

/// Validated object location extracted from an [`AnalysisRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Per-request identifier used to namespace frame cache keys
///
/// Minted once per request and never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Mint a fresh identifier
    pub fn new() -> Self {
        Self(spoofscan_common::uuid_utils::generate())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mono audio at the pipeline's target sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Timing of a frame within the source waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpan {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
}

impl FrameSpan {
    /// Compute the span of frame `index` for frames of `frame_len` samples
    ///
    /// `start_time` is computed from the sample offset so that it is exactly
    /// `index * frame_len / sample_rate` with no accumulated drift.
    pub fn new(index: usize, frame_len: usize, sample_rate: u32) -> Self {
        let rate = sample_rate as f64;
        let start_time = (index * frame_len) as f64 / rate;
        let end_time = ((index + 1) * frame_len) as f64 / rate;
        Self {
            index,
            start_time,
            end_time,
        }
    }
}

/// One fixed-length slice of a waveform
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub span: FrameSpan,
    /// Exactly `frame_len` samples
    pub samples: Vec<f32>,
    /// Number of trailing zero samples appended to reach `frame_len`
    pub padding: usize,
}

impl Frame {
    pub fn index(&self) -> usize {
        self.span.index
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Score for one successfully processed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Identifier derived from the frame index (`chunk_<index>`)
    pub id: String,
    pub frame_index: usize,
    /// Probability in [0, 1], rounded to the configured precision
    pub score: f64,
    pub start_time: f64,
    pub end_time: f64,
}

impl Prediction {
    pub fn new(span: FrameSpan, score: f64) -> Self {
        Self {
            id: frame_id(span.index),
            frame_index: span.index,
            score,
            start_time: span.start_time,
            end_time: span.end_time,
        }
    }
}

/// Failure confined to a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError {
    pub frame_index: usize,
    pub message: String,
}

impl FrameError {
    pub fn new(frame_index: usize, message: impl Into<String>) -> Self {
        Self {
            frame_index,
            message: message.into(),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error for {}: {}", frame_id(self.frame_index), self.message)
    }
}

/// Result of processing one frame through the dispatcher
pub type FrameOutcome = Result<Prediction, FrameError>;

/// Response for a completed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Predictions ordered by `start_time`
    pub predictions: Vec<Prediction>,
    /// All per-frame errors joined with `"; "`, empty when none occurred
    pub error_summary: String,
}

/// Frame identifier used in predictions, error messages and cache keys
pub fn frame_id(index: usize) -> String {
    format!("chunk_{}", index)
}
