//! Image storage for ad attachments.
//!
//! Images live as flat files in the upload directory, named `<uuid>.<ext>`.
//! The file name is the reference stored on the ad.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Persists and releases ad images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the bytes and returns the reference to record on the ad.
    async fn save(&self, bytes: &[u8], mime_type: &str) -> Result<String>;

    /// Releases a previously stored image. Missing files are not an error.
    async fn remove(&self, reference: &str) -> Result<()>;
}

pub fn validate_image_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn get_extension_from_mime(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn sanitize_filename(filename: &str) -> bool {
    // Reject path traversal and special characters
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

/// Stores images on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create upload directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        self.ensure_dir().await?;

        let filename = format!("{}.{}", Uuid::new_v4(), get_extension_from_mime(mime_type));
        let file_path = self.root.join(&filename);

        tokio::fs::write(&file_path, bytes).await.map_err(|e| {
            AppError::Storage(format!("failed to write upload {}: {}", filename, e))
        })?;

        tracing::debug!("Image stored: {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        if !sanitize_filename(reference) {
            return Err(AppError::Storage(format!(
                "refusing to remove suspicious image path {:?}",
                reference
            )));
        }

        match tokio::fs::remove_file(self.root.join(reference)).await {
            Ok(()) => {
                tracing::debug!("Image removed: {}", reference);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "failed to remove image {}: {}",
                reference, e
            ))),
        }
    }
}
