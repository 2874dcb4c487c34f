//! Analysis endpoint
//!
//! POST /analyze with `{"bucket": "...", "object_key": "..."}`. A success
//! carries every surviving prediction plus the per-frame error summary; a
//! request-fatal failure maps to the status and JSON body of
//! [`AnalysisError`].

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::warn;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{AnalysisRequest, AnalysisResponse};
use crate::AppState;

/// POST /analyze
pub async fn analyze_audio(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> AnalysisResult<Json<AnalysisResponse>> {
    let Json(request) =
        payload.map_err(|rejection| AnalysisError::InvalidArgument(rejection.body_text()))?;

    match state.pipeline.analyze_with_deadline(request.clone()).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            warn!(
                bucket = request.bucket.as_deref().unwrap_or_default(),
                key = request.object_key.as_deref().unwrap_or_default(),
                code = err.code(),
                error = %err,
                "Analysis failed"
            );
            *state.last_error.write().await = Some(err.to_string());
            Err(err)
        }
    }
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_audio))
}
