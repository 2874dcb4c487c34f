//! In-process object store
//!
//! Holds objects in a map. Used by tests and local experiments; it can be
//! switched into an unreachable state to exercise transient-failure handling.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ObjectStore, StoreError};

#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashSet<String>>,
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket
    pub async fn create_bucket(&self, bucket: &str) {
        self.buckets.write().await.insert(bucket.to_string());
    }

    /// Store an object, creating its bucket if needed
    pub async fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.create_bucket(bucket).await;
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
    }

    /// Simulate the store becoming unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "Object store unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        self.check_reachable()?;
        Ok(self.buckets.read().await.contains(bucket))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.check_reachable()?;
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("Object '{}' not found in bucket '{}'", key, bucket))
            })
    }
}
