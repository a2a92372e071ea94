//! Blob storage for transcripts, scorecards and recordings.
//!
//! Containers map onto buckets of an S3-compatible object store (`S3BlobStore`).
//! Handlers depend on the `BlobStore` trait only.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod s3;

pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {container}/{key} failed: {message}")]
    Upload {
        container: String,
        key: String,
        message: String,
    },

    #[error("container {container} unavailable: {message}")]
    Container { container: String, message: String },
}

/// One object write.
#[derive(Debug, Clone)]
pub struct PutObject<'a> {
    pub container: &'a str,
    pub key: &'a str,
    pub body: Bytes,
    pub content_type: &'a str,
    pub metadata: Vec<(&'a str, String)>,
}

impl<'a> PutObject<'a> {
    pub fn new(container: &'a str, key: &'a str, body: Bytes, content_type: &'a str) -> Self {
        Self {
            container,
            key,
            body,
            content_type,
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.metadata.push((name, value.into()));
        self
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the container if it does not exist yet.
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError>;

    /// Writes one object, returning its URL.
    async fn put(&self, object: PutObject<'_>) -> Result<String, StorageError>;
}

/// `<base>/<container>/<key>`
pub fn object_url(base: &str, container: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), container, key)
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;

    use tokio::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct StoredObject {
        pub body: Bytes,
        pub content_type: String,
        pub metadata: HashMap<String, String>,
    }

    /// In-memory blob store for tests. Keys listed in `fail_keys` reject writes.
    #[derive(Default)]
    pub struct MemoryBlobStore {
        pub objects: Mutex<HashMap<String, StoredObject>>,
        pub fail_keys: Vec<String>,
    }

    impl MemoryBlobStore {
        pub async fn get(&self, container: &str, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .await
                .get(&format!("{container}/{key}"))
                .cloned()
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn ensure_container(&self, _container: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn put(&self, object: PutObject<'_>) -> Result<String, StorageError> {
            if self.fail_keys.iter().any(|k| k == object.key) {
                return Err(StorageError::Upload {
                    container: object.container.to_string(),
                    key: object.key.to_string(),
                    message: "injected failure".to_string(),
                });
            }
            self.objects.lock().await.insert(
                format!("{}/{}", object.container, object.key),
                StoredObject {
                    body: object.body,
                    content_type: object.content_type.to_string(),
                    metadata: object
                        .metadata
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                },
            );
            Ok(object_url("memory://blobs", object.container, object.key))
        }
    }
}
