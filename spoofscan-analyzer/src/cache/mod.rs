//! Frame Cache
//!
//! Stages each frame's samples in a key-value store with per-key expiry so
//! that scoring workers can fetch frames independently of segmentation.
//! Keys are namespaced by the request's correlation id
//! (`<correlation_id>:chunk_<index>`), so concurrent requests never collide.
//! Samples are stored as little-endian `f32`.

pub mod memory;

pub use memory::MemoryKvStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{frame_id, CorrelationId};

/// Size of one encoded sample in bytes
pub const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Cache collaborator failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Internal(String),
}

/// Key-value store with per-key expiry
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Read `key`; `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Remove `key` if present
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache key for one frame of one request
pub fn frame_key(correlation_id: &CorrelationId, index: usize) -> String {
    format!("{}:{}", correlation_id, frame_id(index))
}

/// Encode samples as little-endian `f32` bytes
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Decode little-endian `f32` bytes; `None` if the length is not a whole number of samples
pub fn decode_samples(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(SAMPLE_BYTES)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

/// Frame staging area shared by all requests
#[derive(Clone)]
pub struct FrameCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl FrameCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stage one frame's encoded bytes
    pub async fn put(
        &self,
        correlation_id: &CorrelationId,
        index: usize,
        bytes: Vec<u8>,
    ) -> Result<(), CacheError> {
        let key = frame_key(correlation_id, index);
        self.store.set(&key, bytes, self.ttl).await?;
        debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Frame staged");
        Ok(())
    }

    /// Read one staged frame back
    pub async fn get(
        &self,
        correlation_id: &CorrelationId,
        index: usize,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        self.store.get(&frame_key(correlation_id, index)).await
    }

    /// Remove staged frames of a finished request
    ///
    /// Best effort: failures are logged and otherwise ignored since the TTL
    /// reclaims the entries anyway.
    pub async fn evict(&self, correlation_id: &CorrelationId, indices: &[usize]) {
        for &index in indices {
            let key = frame_key(correlation_id, index);
            if let Err(e) = self.store.delete(&key).await {
                warn!(key = %key, error = %e, "Failed to evict staged frame");
            }
        }
    }
}
