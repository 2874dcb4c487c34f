//! Scoring collaborator
//!
//! A scorer maps one fixed-length frame of samples to a probability in
//! [0, 1]. The pipeline knows nothing about how the score is produced; the
//! scorer is built once at startup and shared by reference with every request.

pub mod energy;

pub use energy::EnergyScorer;

use thiserror::Error;

/// Scorer failure for a single frame
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// Scorer could not evaluate the frame
    #[error("{0}")]
    Failed(String),

    /// Scorer returned something that is not a probability
    #[error("Score {0} is outside [0, 1]")]
    OutOfRange(f64),
}

/// In-process frame scorer
///
/// Called from the blocking thread pool, one call per frame, possibly from
/// several threads at once.
pub trait Scorer: Send + Sync {
    /// Scorer name for logging
    fn name(&self) -> &str;

    /// Score a frame of exactly the pipeline's frame length
    fn score(&self, frame: &[f32]) -> Result<f64, ScoringError>;
}

/// Reject NaN and values outside [0, 1]
pub fn check_probability(score: f64) -> Result<f64, ScoringError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScoringError::OutOfRange(score))
    }
}

/// Round a probability to `decimals` decimal places
pub fn round_score(score: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (score * factor).round() / factor
}
