//! Scoring Dispatcher
//!
//! Scatter-gather over the staged frames of one request. Each frame is read
//! back from the frame cache, length-checked, scored on the blocking thread
//! pool, and rounded. At most `workers` frames are in flight at once no matter
//! how many frames the request has.
//!
//! Every frame yields a [`FrameOutcome`]. Cache misses, size mismatches,
//! scorer errors, scorer panics and per-frame timeouts all become a
//! [`FrameError`] for that frame alone; sibling frames are never cancelled.
//! `dispatch` returns once every frame has an outcome, in completion order.
//!
//! A scorer call holds a worker permit until the blocking call returns, so a
//! frame that times out keeps its permit until its scorer actually finishes.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cache::{decode_samples, frame_key, FrameCache, SAMPLE_BYTES};
use crate::error::AnalysisError;
use crate::scoring::{check_probability, round_score, Scorer};
use crate::types::{CorrelationId, FrameError, FrameOutcome, FrameSpan, Prediction};

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Samples per frame
    pub frame_len: usize,
    /// Maximum frames scored concurrently
    pub workers: usize,
    /// Decimal places kept in scores
    pub score_precision: u32,
    /// Optional limit on a single frame's scoring time
    pub frame_timeout: Option<Duration>,
}

pub struct ScoringDispatcher {
    cache: FrameCache,
    scorer: Arc<dyn Scorer>,
    settings: DispatchSettings,
}

impl ScoringDispatcher {
    pub fn new(cache: FrameCache, scorer: Arc<dyn Scorer>, settings: DispatchSettings) -> Self {
        Self {
            cache,
            scorer,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Score every staged frame, returning one outcome per span
    pub async fn dispatch(
        &self,
        correlation_id: CorrelationId,
        spans: Vec<FrameSpan>,
    ) -> Vec<FrameOutcome> {
        let started = Instant::now();
        let total = spans.len();
        let workers = self.settings.workers.max(1);

        debug!(
            correlation_id = %correlation_id,
            frames = total,
            workers,
            scorer = self.scorer.name(),
            "Dispatching frames for scoring"
        );

        let permits = Arc::new(Semaphore::new(workers));
        let outcomes: Vec<FrameOutcome> = stream::iter(spans)
            .map(|span| self.score_frame(correlation_id, span, &permits))
            .buffer_unordered(workers)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        debug!(
            correlation_id = %correlation_id,
            frames = total,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scoring dispatch complete"
        );

        outcomes
    }

    async fn score_frame(
        &self,
        correlation_id: CorrelationId,
        span: FrameSpan,
        permits: &Arc<Semaphore>,
    ) -> FrameOutcome {
        let outcome = self.try_score_frame(correlation_id, span, permits).await;
        if let Err(err) = &outcome {
            warn!(
                correlation_id = %correlation_id,
                frame_index = err.frame_index,
                error = %err.message,
                "Frame failed"
            );
        }
        outcome
    }

    async fn try_score_frame(
        &self,
        correlation_id: CorrelationId,
        span: FrameSpan,
        permits: &Arc<Semaphore>,
    ) -> FrameOutcome {
        let index = span.index;
        let frame_error = |err: AnalysisError| FrameError::new(index, err.to_string());

        let bytes = match self.cache.get(&correlation_id, index).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(frame_error(AnalysisError::Internal(format!(
                    "Chunk {} not found in cache",
                    frame_key(&correlation_id, index)
                ))))
            }
            Err(e) => return Err(frame_error(e.into())),
        };

        let expected = self.settings.frame_len * SAMPLE_BYTES;
        if bytes.len() != expected {
            return Err(frame_error(AnalysisError::SizeMismatch(format!(
                "Chunk has {} bytes, expected {} ({} samples)",
                bytes.len(),
                expected,
                self.settings.frame_len
            ))));
        }

        let samples = decode_samples(&bytes).ok_or_else(|| {
            frame_error(AnalysisError::SizeMismatch(
                "Chunk is not a whole number of samples".to_string(),
            ))
        })?;

        let permit = Arc::clone(permits).acquire_owned().await.map_err(|e| {
            frame_error(AnalysisError::Internal(format!(
                "Scoring worker pool closed: {}",
                e
            )))
        })?;

        let scorer = Arc::clone(&self.scorer);
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            scorer.score(&samples).and_then(check_probability)
        });

        let joined = match self.settings.frame_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(frame_error(AnalysisError::DeadlineExceeded(format!(
                        "Scoring exceeded {:?}",
                        limit
                    ))))
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(score)) => Ok(Prediction::new(
                span,
                round_score(score, self.settings.score_precision),
            )),
            Ok(Err(e)) => Err(frame_error(AnalysisError::Scoring(e))),
            Err(join_err) => Err(frame_error(AnalysisError::Internal(format!(
                "Scoring task failed: {}",
                join_err
            )))),
        }
    }
}
