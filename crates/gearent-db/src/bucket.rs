//! # Image Bucket
//!
//! Product images stored as files under one directory, served from a public
//! base URL.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  root/                          public_base_url/                        │
//! │  └── products/                  └── products/                           │
//! │      └── {product}-{uuid}.jpg  ◄──►   {product}-{uuid}.jpg              │
//! │                                                                         │
//! │  upload()  → writes the file, returns { key, public_url }              │
//! │  remove()  → deletes the file (missing file is not an error)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gearent_core::Id;

/// Extensions accepted for product images.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Path relative to the bucket root, always `/`-separated.
    pub key: String,
    pub public_url: String,
}

/// Directory-backed image storage.
#[derive(Debug, Clone)]
pub struct ImageBucket {
    root: PathBuf,
    public_base_url: String,
}

impl ImageBucket {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        ImageBucket {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }

    /// Stores an image for `product_id` under a fresh, unique key.
    ///
    /// ## Errors
    /// * `DbError::InvalidUpload` - empty, too large, or not an image extension
    /// * `DbError::Io` - the file couldn't be written
    pub async fn upload(
        &self,
        product_id: &Id,
        file_name: &str,
        bytes: &[u8],
    ) -> DbResult<StoredImage> {
        if bytes.is_empty() {
            return Err(DbError::InvalidUpload("file is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DbError::InvalidUpload(format!(
                "file is larger than {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        let extension = image_extension(file_name)?;
        let key = format!("products/{}-{}.{}", product_id, Uuid::new_v4(), extension);
        let path = self.path_for(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        info!(key = %key, bytes = bytes.len(), "Image uploaded");

        Ok(StoredImage {
            public_url: self.public_url(&key),
            key,
        })
    }

    /// Deletes a stored image. A missing file is not an error.
    pub async fn remove(&self, key: &str) -> DbResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a public URL produced by this bucket back to its key.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }

    /// Resolves a key inside the root, rejecting anything that escapes it.
    fn path_for(&self, key: &str) -> DbResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(DbError::InvalidUpload(format!("invalid key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

fn image_extension(file_name: &str) -> DbResult<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(DbError::InvalidUpload(format!(
            "'{}' is not an image ({})",
            file_name,
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(dir: &Path) -> ImageBucket {
        ImageBucket::new(dir, "http://localhost:3000/images/")
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket(dir.path());

        let stored = bucket
            .upload(&Id::from(12), "Kayak.PNG", b"\x89PNG fake")
            .await
            .unwrap();

        assert!(stored.key.starts_with("products/12-"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(
            stored.public_url,
            format!("http://localhost:3000/images/{}", stored.key)
        );
        let written = tokio::fs::read(dir.path().join(&stored.key)).await.unwrap();
        assert_eq!(written, b"\x89PNG fake");

        assert_eq!(bucket.key_from_url(&stored.public_url), Some(stored.key.clone()));

        bucket.remove(&stored.key).await.unwrap();
        bucket.remove(&stored.key).await.unwrap();
        assert!(!dir.path().join(&stored.key).exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket(dir.path());
        let id = Id::from(1);

        assert!(matches!(
            bucket.upload(&id, "notes.txt", b"hi").await,
            Err(DbError::InvalidUpload(_))
        ));
        assert!(matches!(
            bucket.upload(&id, "photo.jpg", b"").await,
            Err(DbError::InvalidUpload(_))
        ));
        assert!(matches!(
            bucket.remove("../outside.jpg").await,
            Err(DbError::InvalidUpload(_))
        ));
    }
}
