//! Object Retrieval Gateway
//!
//! Fetches audio blobs from an object store by bucket/key. Backends implement
//! [`ObjectStore`]; the pipeline talks to them through [`ObjectGateway`], which
//! adds the optional bucket existence check. There are no retries: a single attempt is
//! made and failures are returned immediately.

pub mod fs;
pub mod http;
pub mod memory;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::types::ObjectRef;

/// Object store failure, keeping not-found distinct from transient failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

/// Object store backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Check that a bucket exists
    ///
    /// Backends that cannot answer return `Ok(true)` and let the read decide.
    async fn bucket_exists(&self, _bucket: &str) -> Result<bool, StoreError> {
        Ok(true)
    }

    /// Read a whole object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Shared, read-mostly handle to the configured object store
#[derive(Clone)]
pub struct ObjectGateway {
    store: Arc<dyn ObjectStore>,
    check_bucket: bool,
}

impl ObjectGateway {
    pub fn new(store: Arc<dyn ObjectStore>, check_bucket: bool) -> Self {
        Self {
            store,
            check_bucket,
        }
    }

    /// Fetch an object's bytes
    ///
    /// An empty payload is returned as-is; the caller decides what it means.
    pub async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>, StoreError> {
        if self.check_bucket && !self.store.bucket_exists(&object.bucket).await? {
            return Err(StoreError::NotFound(format!(
                "Bucket '{}' not found",
                object.bucket
            )));
        }

        let bytes = self.store.get_object(&object.bucket, &object.key).await?;

        debug!(
            store = self.store.name(),
            bucket = %object.bucket,
            key = %object.key,
            bytes = bytes.len(),
            "Object fetched"
        );

        Ok(bytes)
    }
}
