//! Filesystem-backed object store
//!
//! Buckets are directories directly under the store root; keys are relative
//! paths inside a bucket. Keys that try to leave the bucket are treated as
//! absent objects.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{ObjectStore, StoreError};

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Option<PathBuf> {
        let path = Path::new(bucket);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.root.join(path)),
            _ => None,
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let bucket_path = self.bucket_path(bucket)?;
        let key_path = Path::new(key);
        let safe = key_path.components().count() > 0
            && key_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| bucket_path.join(key_path))
    }

    async fn check_root(&self) -> Result<(), StoreError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "Store root {} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(StoreError::Unavailable(format!(
                "Store root {} unreachable: {}",
                self.root.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        self.check_root().await?;
        let Some(path) = self.bucket_path(bucket) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Internal(format!(
                "Bucket check for '{}' failed: {}",
                bucket, e
            ))),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.check_root().await?;
        let not_found =
            || StoreError::NotFound(format!("Object '{}' not found in bucket '{}'", key, bucket));

        let path = self.object_path(bucket, key).ok_or_else(not_found)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(StoreError::Internal(format!(
                "Read of '{}/{}' failed: {}",
                bucket, key, e
            ))),
        }
    }
}
