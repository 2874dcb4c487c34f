//! Aggregator
//!
//! Folds the per-frame outcomes of one request into the response. Predictions
//! are put back in time order and every frame error is kept in the summary,
//! so a partial success is reported rather than hidden. No numeric roll-up of
//! the scores is computed.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{AnalysisResponse, FrameError, FrameOutcome, Prediction};

/// Separator between entries of the error summary
pub const SUMMARY_SEPARATOR: &str = "; ";

/// Combine dispatcher outcomes and staging failures into a response
///
/// * Any prediction: success, predictions sorted by `start_time`.
/// * No predictions but errors: `Internal` carrying the error summary.
/// * Nothing at all: `NoFramesProcessed`.
pub fn aggregate(
    outcomes: Vec<FrameOutcome>,
    staging_errors: Vec<FrameError>,
) -> AnalysisResult<AnalysisResponse> {
    let mut predictions: Vec<Prediction> = Vec::with_capacity(outcomes.len());
    let mut errors = staging_errors;

    for outcome in outcomes {
        match outcome {
            Ok(prediction) => predictions.push(prediction),
            Err(err) => errors.push(err),
        }
    }

    let error_summary = summarize(&mut errors);

    if predictions.is_empty() {
        if errors.is_empty() {
            return Err(AnalysisError::NoFramesProcessed(
                "No frames were scored and no errors were recorded".to_string(),
            ));
        }
        return Err(AnalysisError::Internal(error_summary));
    }

    predictions.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    Ok(AnalysisResponse {
        predictions,
        error_summary,
    })
}

/// Join frame errors in frame order
pub fn summarize(errors: &mut [FrameError]) -> String {
    errors.sort_by_key(|e| e.frame_index);
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}
