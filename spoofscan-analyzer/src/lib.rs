//! spoofscan-analyzer library interface
//!
//! Chunked audio analysis: fetch an object, normalize it to mono 16 kHz,
//! cut it into fixed-length frames, stage the frames in a TTL cache, score
//! them with bounded concurrency and return per-frame predictions.

pub mod aggregate;
pub mod api;
pub mod audio;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod storage;
pub mod types;

pub use crate::error::{AnalysisError, AnalysisResult};
pub use crate::pipeline::{AnalysisPipeline, PipelineSettings};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last request-fatal error, reported by /health
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self {
            pipeline,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
