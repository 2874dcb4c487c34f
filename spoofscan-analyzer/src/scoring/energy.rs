//! Baseline energy scorer
//!
//! Logistic function of the frame's RMS level in dBFS. It has no trained
//! parameters and stands in for a real classifier so the service runs end
//! to end.

use serde::Deserialize;

use super::{Scorer, ScoringError};

/// Level assigned to digital silence
const SILENCE_DBFS: f64 = -120.0;

/// Tuning for [`EnergyScorer`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnergyScorerConfig {
    /// Level (dBFS) that maps to a score of 0.5
    pub midpoint_dbfs: f64,
    /// Logistic slope per dB
    pub slope: f64,
}

impl Default for EnergyScorerConfig {
    fn default() -> Self {
        Self {
            midpoint_dbfs: -30.0,
            slope: 0.25,
        }
    }
}

pub struct EnergyScorer {
    config: EnergyScorerConfig,
}

impl EnergyScorer {
    pub fn new(config: EnergyScorerConfig) -> Self {
        Self { config }
    }

    /// RMS level of `frame` in dBFS
    pub fn rms_dbfs(frame: &[f32]) -> f64 {
        if frame.is_empty() {
            return SILENCE_DBFS;
        }
        let mean_square =
            frame.iter().map(|s| (*s as f64) * (*s as f64)).sum::<f64>() / frame.len() as f64;
        if mean_square <= 0.0 {
            return SILENCE_DBFS;
        }
        (10.0 * mean_square.log10()).max(SILENCE_DBFS)
    }
}

impl Default for EnergyScorer {
    fn default() -> Self {
        Self::new(EnergyScorerConfig::default())
    }
}

impl Scorer for EnergyScorer {
    fn name(&self) -> &str {
        "energy"
    }

    fn score(&self, frame: &[f32]) -> Result<f64, ScoringError> {
        if frame.iter().any(|s| !s.is_finite()) {
            return Err(ScoringError::Failed(
                "Frame contains non-finite samples".to_string(),
            ));
        }
        let level = Self::rms_dbfs(frame);
        let x = self.config.slope * (level - self.config.midpoint_dbfs);
        Ok(1.0 / (1.0 + (-x).exp()))
    }
}
