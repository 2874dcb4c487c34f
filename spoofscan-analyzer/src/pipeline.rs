//! Analysis pipeline
//!
//! Runs one request to completion:
//!
//! 1. validate the request and mint a correlation id
//! 2. fetch the object through the gateway
//! 3. normalize it on the blocking pool
//! 4. segment and stage every frame in the frame cache
//! 5. score the staged frames through the dispatcher
//! 6. aggregate the outcomes into the response
//!
//! Retrieval and decode failures end the request immediately. Staging and
//! scoring failures are collected per frame and only become fatal when no
//! prediction survives.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, summarize};
use crate::audio::{AudioNormalizer, Segmenter};
use crate::cache::{encode_samples, FrameCache};
use crate::dispatch::ScoringDispatcher;
use crate::error::{AnalysisError, AnalysisResult};
use crate::storage::ObjectGateway;
use crate::types::{
    AnalysisRequest, AnalysisResponse, CorrelationId, Frame, FrameError, FrameSpan, ObjectRef,
};

/// Request-level pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// End-to-end deadline for one request
    pub request_timeout: Duration,
    /// Delete staged frames once scoring has finished
    pub evict_after_scoring: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
            evict_after_scoring: false,
        }
    }
}

pub struct AnalysisPipeline {
    gateway: ObjectGateway,
    normalizer: Arc<AudioNormalizer>,
    segmenter: Segmenter,
    cache: FrameCache,
    dispatcher: ScoringDispatcher,
    settings: PipelineSettings,
}

impl AnalysisPipeline {
    pub fn new(
        gateway: ObjectGateway,
        normalizer: AudioNormalizer,
        segmenter: Segmenter,
        cache: FrameCache,
        dispatcher: ScoringDispatcher,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            gateway,
            normalizer: Arc::new(normalizer),
            segmenter,
            cache,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run [`analyze`](Self::analyze) under the configured request deadline
    ///
    /// On expiry all in-flight work for the request is dropped.
    pub async fn analyze_with_deadline(
        &self,
        request: AnalysisRequest,
    ) -> AnalysisResult<AnalysisResponse> {
        let limit = self.settings.request_timeout;
        match tokio::time::timeout(limit, self.analyze(request)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::DeadlineExceeded(format!(
                "Analysis did not finish within {}s",
                limit.as_secs_f64()
            ))),
        }
    }

    /// Analyze one audio object
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResult<AnalysisResponse> {
        let started = Instant::now();
        let object = validate(request)?;
        let correlation_id = CorrelationId::new();

        debug!(
            correlation_id = %correlation_id,
            bucket = %object.bucket,
            key = %object.key,
            "Analysis started"
        );

        let bytes = self.gateway.fetch(&object).await?;
        if bytes.is_empty() {
            return Err(AnalysisError::Internal(format!(
                "Object '{}/{}' is empty",
                object.bucket, object.key
            )));
        }

        let normalizer = Arc::clone(&self.normalizer);
        let waveform = tokio::task::spawn_blocking(move || normalizer.normalize(&bytes))
            .await
            .map_err(|e| AnalysisError::Internal(format!("Normalizer task failed: {}", e)))??;

        debug!(
            correlation_id = %correlation_id,
            samples = waveform.len(),
            duration_secs = waveform.duration_seconds(),
            "Audio normalized"
        );

        let frames = self.segmenter.segment(&waveform)?;
        drop(waveform);

        let (staged, staging_errors) = self.stage(&correlation_id, frames).await;
        if staged.is_empty() {
            let mut errors = staging_errors;
            return Err(AnalysisError::Internal(summarize(&mut errors)));
        }

        let staged_indices: Vec<usize> = staged.iter().map(|span| span.index).collect();
        let outcomes = self.dispatcher.dispatch(correlation_id, staged).await;

        if self.settings.evict_after_scoring {
            self.cache.evict(&correlation_id, &staged_indices).await;
        }

        let response = aggregate(outcomes, staging_errors)?;

        info!(
            correlation_id = %correlation_id,
            bucket = %object.bucket,
            key = %object.key,
            predictions = response.predictions.len(),
            errors = !response.error_summary.is_empty(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(response)
    }

    /// Write every frame to the cache in order
    ///
    /// Returns the spans that were staged and the failures of those that were not.
    async fn stage(
        &self,
        correlation_id: &CorrelationId,
        frames: Vec<Frame>,
    ) -> (Vec<FrameSpan>, Vec<FrameError>) {
        let mut staged = Vec::with_capacity(frames.len());
        let mut errors = Vec::new();

        for frame in frames {
            let index = frame.index();
            match self
                .cache
                .put(correlation_id, index, encode_samples(&frame.samples))
                .await
            {
                Ok(()) => staged.push(frame.span),
                Err(e) => {
                    warn!(
                        correlation_id = %correlation_id,
                        frame_index = index,
                        error = %e,
                        "Failed to stage frame"
                    );
                    errors.push(FrameError::new(index, e.to_string()));
                }
            }
        }

        debug!(
            correlation_id = %correlation_id,
            staged = staged.len(),
            failed = errors.len(),
            "Frames staged"
        );

        (staged, errors)
    }
}

/// Check mandatory request fields
fn validate(request: AnalysisRequest) -> AnalysisResult<ObjectRef> {
    let bucket = required(request.bucket, "bucket")?;
    let key = required(request.object_key, "object_key")?;
    Ok(ObjectRef { bucket, key })
}

fn required(value: Option<String>, field: &str) -> AnalysisResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AnalysisError::InvalidArgument(format!(
            "'{}' must not be blank",
            field
        ))),
        None => Err(AnalysisError::InvalidArgument(format!(
            "'{}' is required",
            field
        ))),
    }
}
