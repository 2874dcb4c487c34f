//! HTTP object store client
//!
//! Talks to an S3-compatible endpoint using path-style addressing
//! (`<endpoint>/<bucket>/<key>`) with anonymous access. `HEAD <endpoint>/<bucket>`
//! is used for the bucket existence check.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::{ObjectStore, StoreError};

const USER_AGENT: &str = concat!("spoofscan-analyzer/", env!("CARGO_PKG_VERSION"));

pub struct HttpObjectStore {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/{}", self.endpoint, bucket)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key.trim_start_matches('/'))
    }
}

/// Classify a transport-level failure
fn transport_error(context: &str, err: reqwest::Error) -> StoreError {
    if err.is_connect() || err.is_timeout() {
        StoreError::Unavailable(format!("{}: {}", context, err))
    } else {
        StoreError::Internal(format!("{}: {}", context, err))
    }
}

/// Classify a non-success HTTP status
fn status_error(context: &str, status: StatusCode) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(format!("{}: not found", context)),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::Unavailable(format!("{}: HTTP {}", context, status))
        }
        _ => StoreError::Internal(format!("{}: HTTP {}", context, status)),
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let context = format!("Bucket check for '{}'", bucket);
        let response = self
            .http_client
            .head(self.bucket_url(bucket))
            .send()
            .await
            .map_err(|e| transport_error(&context, e))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(status_error(&context, s)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let context = format!("Object '{}' in bucket '{}'", key, bucket);

        tracing::debug!(bucket = %bucket, key = %key, "Requesting object over HTTP");

        let response = self
            .http_client
            .get(self.object_url(bucket, key))
            .send()
            .await
            .map_err(|e| transport_error(&context, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(&context, status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&context, e))?;

        Ok(bytes.to_vec())
    }
}
