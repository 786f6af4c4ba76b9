use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use swipely_shared::errors::{AppError, AppResult, ErrorCode};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A picked image waiting for the next profile save.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
}

impl StagedImage {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> AppResult<Self> {
        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::new(
                ErrorCode::UnsupportedImage,
                "unsupported image format, accepted: jpeg, png, webp, gif",
            )
        })?;

        if bytes.is_empty() {
            return Err(AppError::new(ErrorCode::UnsupportedImage, "image is empty"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::new(ErrorCode::PayloadTooLarge, "image exceeds 10 MiB"));
        }

        Ok(Self {
            bytes,
            content_type: content_type.to_string(),
            extension,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// The device's photo library.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    async fn pick(&self, name: &str) -> AppResult<StagedImage>;
}

/// Media library backed by a local directory. Access is denied when the
/// directory does not exist.
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaLibrary for DirectoryLibrary {
    async fn request_permission(&self) -> PermissionStatus {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => PermissionStatus::Granted,
            _ => PermissionStatus::Denied,
        }
    }

    async fn pick(&self, name: &str) -> AppResult<StagedImage> {
        if self.request_permission().await == PermissionStatus::Denied {
            return Err(AppError::new(
                ErrorCode::MediaPermissionDenied,
                "media library permission denied",
            ));
        }

        // Only plain file names inside the library root
        let candidate = Path::new(name);
        if candidate.file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(AppError::bad_request("invalid media file name"));
        }

        let content_type = content_type_for(candidate).ok_or_else(|| {
            AppError::new(
                ErrorCode::UnsupportedImage,
                "unsupported image format, accepted: jpeg, png, webp, gif",
            )
        })?;

        let path = self.root.join(candidate);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::not_found(format!("no media file named {name}"))
            }
            _ => AppError::internal(format!("failed to read {}: {e}", path.display())),
        })?;

        tracing::debug!(file = %name, bytes = bytes.len(), "image picked from media library");
        StagedImage::new(content_type, bytes)
    }
}
