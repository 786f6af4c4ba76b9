use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use swipely_shared::clients::s3::{S3Client, S3Error};
use swipely_shared::errors::{AppError, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    S3(#[from] S3Error),

    #[error("object storage rejected {key}: {message}")]
    Rejected { key: String, message: String },
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::new(ErrorCode::PhotoUploadFailed, e.to_string())
    }
}

/// Remote object storage for profile pictures.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `key` and return the reference to persist.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn is_reachable(&self) -> bool;
}

pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        Ok(self.client.put(key, body, content_type).await?)
    }

    async fn is_reachable(&self) -> bool {
        self.client.bucket_reachable().await
    }
}

/// In-process object storage.
pub struct MemoryStorage {
    public_url: String,
    objects: DashMap<String, (String, Vec<u8>)>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            objects: DashMap::new(),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|entry| entry.value().0.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                key: key.to_string(),
                message: "storage offline".into(),
            });
        }
        self.objects.insert(key.to_string(), (content_type.to_string(), body));
        Ok(format!("{}/{key}", self.public_url))
    }

    async fn is_reachable(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_put_returns_public_reference() {
        let storage = MemoryStorage::new("http://cdn.local/");
        let url = storage.put("profiles/a/b.png", vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(url, "http://cdn.local/profiles/a/b.png");
        assert_eq!(storage.content_type("profiles/a/b.png").as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn failure_maps_to_upload_error() {
        let storage = MemoryStorage::new("http://cdn.local");
        storage.set_failing(true);
        let err = storage.put("k", vec![], "image/png").await.unwrap_err();
        assert_eq!(AppError::from(err).code(), ErrorCode::PhotoUploadFailed);
        assert!(storage.is_empty());
    }
}
