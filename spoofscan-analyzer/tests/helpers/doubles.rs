//! Test doubles for the cache and scoring collaborators

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use spoofscan_analyzer::cache::{CacheError, KvStore, MemoryKvStore};
use spoofscan_analyzer::scoring::{Scorer, ScoringError};

/// In-memory store that counts writes
#[derive(Default)]
pub struct CountingKvStore {
    pub inner: Arc<MemoryKvStore>,
    pub sets: AtomicUsize,
}

impl CountingKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for CountingKvStore {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }
}

/// Store that refuses every write whose key ends with one of `failing_suffixes`,
/// or every write when the list is empty
pub struct FailingKvStore {
    inner: MemoryKvStore,
    failing_suffixes: Vec<String>,
}

impl FailingKvStore {
    /// Unreachable for all writes
    pub fn unreachable() -> Self {
        Self {
            inner: MemoryKvStore::new(),
            failing_suffixes: Vec::new(),
        }
    }

    /// Unreachable only for the given frame indices
    pub fn failing_frames(indices: &[usize]) -> Self {
        Self {
            inner: MemoryKvStore::new(),
            failing_suffixes: indices.iter().map(|i| format!(":chunk_{}", i)).collect(),
        }
    }
}

#[async_trait]
impl KvStore for FailingKvStore {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let fails = self.failing_suffixes.is_empty()
            || self.failing_suffixes.iter().any(|s| key.ends_with(s.as_str()));
        if fails {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }
}

/// Constant scorer that counts its calls
#[derive(Default)]
pub struct TallyScorer {
    pub calls: AtomicUsize,
}

impl TallyScorer {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scorer for TallyScorer {
    fn name(&self) -> &str {
        "tally"
    }

    fn score(&self, _frame: &[f32]) -> Result<f64, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0.73219)
    }
}

/// Fails frames whose trailing quarter is all zeros (zero-padded frames)
pub struct PaddingFailScorer;

impl Scorer for PaddingFailScorer {
    fn name(&self) -> &str {
        "padding-fail"
    }

    fn score(&self, frame: &[f32]) -> Result<f64, ScoringError> {
        let tail = &frame[frame.len() * 3 / 4..];
        if tail.iter().all(|s| *s == 0.0) {
            return Err(ScoringError::Failed("frame is padded".to_string()));
        }
        Ok(0.5)
    }
}

/// Sleeps before every call
pub struct SleepyScorer {
    pub delay: Duration,
}

impl Scorer for SleepyScorer {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn score(&self, _frame: &[f32]) -> Result<f64, ScoringError> {
        std::thread::sleep(self.delay);
        Ok(0.1)
    }
}
