//! Error types for spoofscan-analyzer
//!
//! Request-fatal failures of the analysis pipeline. Per-frame failures are
//! carried as [`crate::types::FrameError`] values instead and only become an
//! `AnalysisError` when no frame produced a prediction.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheError;
use crate::scoring::ScoringError;
use crate::storage::StoreError;

/// Request-fatal analysis error
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing or malformed request fields
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Bucket or object absent from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store or cache unreachable
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// No codec hint could decode the payload
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Decoded audio was zero-length or entirely silent
    #[error("Empty audio: {0}")]
    EmptyAudio(String),

    /// Frame length invariant violated
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// Scoring collaborator failure
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Frames were expected but none reached the scorer or produced an error
    #[error("No frames processed: {0}")]
    NoFramesProcessed(String),

    /// End-to-end request deadline elapsed
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Any other pipeline-wide failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Machine-checkable error code
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AnalysisError::NotFound(_) => "NOT_FOUND",
            AnalysisError::Unavailable(_) => "UNAVAILABLE",
            AnalysisError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AnalysisError::EmptyAudio(_) => "EMPTY_AUDIO",
            AnalysisError::SizeMismatch(_) => "SIZE_MISMATCH",
            AnalysisError::Scoring(_) => "SCORING_ERROR",
            AnalysisError::NoFramesProcessed(_) => "NO_FRAMES_PROCESSED",
            AnalysisError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            AnalysisError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for the error
    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalysisError::UnsupportedFormat(_) | AnalysisError::EmptyAudio(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnalysisError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            AnalysisError::SizeMismatch(_)
            | AnalysisError::Scoring(_)
            | AnalysisError::NoFramesProcessed(_)
            | AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AnalysisError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AnalysisError::NotFound(msg),
            StoreError::Unavailable(msg) => AnalysisError::Unavailable(msg),
            StoreError::Internal(msg) => AnalysisError::Internal(msg),
        }
    }
}

impl From<CacheError> for AnalysisError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable(msg) => AnalysisError::Unavailable(msg),
            CacheError::Internal(msg) => AnalysisError::Internal(msg),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for pipeline operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
