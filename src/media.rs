//! Blob storage for event images.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::config::MediaConfig;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported file type '{0}', expected a JPEG, PNG, GIF or WebP image")]
    UnsupportedType(String),

    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("file is empty")]
    Empty,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub name: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store_image(&self, content_type: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError>;
}

pub type SharedMedia = Arc<dyn MediaStore>;

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Writes blobs to a directory that the router also serves.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            base_path: config.upload_dir.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store_image(&self, content_type: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError> {
        let content_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let extension = extension_for(&content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.clone()))?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(MediaError::TooLarge {
                size: bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }

        fs::create_dir_all(&self.base_path).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(self.base_path.join(&name), bytes).await?;
        tracing::debug!(name = %name, size = bytes.len(), "stored image");

        Ok(StoredMedia {
            url: format!("{}/{}", self.public_base_url, name),
            name,
            content_type,
            size: bytes.len(),
        })
    }
}
