//! Test Helper Utilities
//!
//! Shared fixtures and test doubles for spoofscan-analyzer integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod doubles;

pub use audio_generator::{generate_wav_bytes, WavConfig};
pub use doubles::{
    CountingKvStore, FailingKvStore, PaddingFailScorer, SleepyScorer, TallyScorer,
};

use std::sync::Arc;
use std::time::Duration;

use spoofscan_analyzer::audio::{AudioNormalizer, CodecHint, Segmenter};
use spoofscan_analyzer::cache::{FrameCache, KvStore};
use spoofscan_analyzer::dispatch::{DispatchSettings, ScoringDispatcher};
use spoofscan_analyzer::scoring::Scorer;
use spoofscan_analyzer::storage::{MemoryObjectStore, ObjectGateway, ObjectStore};
use spoofscan_analyzer::{AnalysisPipeline, PipelineSettings};

pub const SAMPLE_RATE: u32 = 16_000;
pub const FRAME_SECONDS: usize = 4;
pub const FRAME_LEN: usize = SAMPLE_RATE as usize * FRAME_SECONDS;
pub const BUCKET: &str = "uploads";

/// Knobs for [`build_pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workers: usize,
    pub evict_after_scoring: bool,
    pub request_timeout: Duration,
    pub frame_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            evict_after_scoring: false,
            request_timeout: Duration::from_secs(60),
            frame_timeout: None,
        }
    }
}

/// Assemble a pipeline at 16 kHz with 4 s frames over the given collaborators
pub fn build_pipeline(
    store: Arc<dyn ObjectStore>,
    kv: Arc<dyn KvStore>,
    scorer: Arc<dyn Scorer>,
    options: PipelineOptions,
) -> AnalysisPipeline {
    let cache = FrameCache::new(kv, Duration::from_secs(3600));
    let dispatcher = ScoringDispatcher::new(
        cache.clone(),
        scorer,
        DispatchSettings {
            frame_len: FRAME_LEN,
            workers: options.workers,
            score_precision: 4,
            frame_timeout: options.frame_timeout,
        },
    );

    AnalysisPipeline::new(
        ObjectGateway::new(store, true),
        AudioNormalizer::new(SAMPLE_RATE, CodecHint::DEFAULT_ORDER.to_vec()),
        Segmenter::new(FRAME_LEN),
        cache,
        dispatcher,
        PipelineSettings {
            request_timeout: options.request_timeout,
            evict_after_scoring: options.evict_after_scoring,
        },
    )
}

/// Object store holding `objects` in [`BUCKET`]
pub async fn store_with(objects: &[(&str, Vec<u8>)]) -> Arc<MemoryObjectStore> {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_bucket(BUCKET).await;
    for (key, bytes) in objects {
        store.insert(BUCKET, key, bytes.clone()).await;
    }
    store
}
