//! Image stage
//!
//! Fetches an item's image and hands the bytes to an [`ImageStore`]. Images
//! are processed one item at a time; a failed image only marks its own record.

use crate::crawler::{FetchError, PageFetcher};
use crate::records::ImageReference;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Extension used when the image URL does not carry a usable one
const DEFAULT_EXTENSION: &str = "jpg";

/// A failed image retrieval
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to store image from {url}: {reason}")]
    Store { url: String, reason: String },
}

/// Persists fetched image bytes
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` fetched from `source_url`, returning where they went
    async fn store(&self, source_url: &str, bytes: &[u8]) -> std::io::Result<String>;
}

/// Stores images as files in one directory
///
/// File names are derived from the source URL, so the same image always maps
/// to the same file.
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    directory: PathBuf,
}

impl DirectoryImageStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// File name used for an image URL
    pub fn file_name(source_url: &str) -> String {
        let digest = Sha256::digest(source_url.as_bytes());
        let stem = &hex::encode(digest)[..16];
        format!("{}.{}", stem, image_extension(source_url))
    }
}

#[async_trait]
impl ImageStore for DirectoryImageStore {
    async fn store(&self, source_url: &str, bytes: &[u8]) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(Self::file_name(source_url));
        tokio::fs::write(&path, bytes).await?;
        Ok(path.display().to_string())
    }
}

/// Fetches and stores item images
pub struct ImageStage {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn ImageStore>,
    timeout: Duration,
}

impl ImageStage {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn ImageStore>, timeout: Duration) -> Self {
        Self {
            fetcher,
            store,
            timeout,
        }
    }

    pub async fn fetch_image(&self, url: &str) -> Result<ImageReference, ImageError> {
        let raw = self.fetcher.fetch(url, self.timeout).await?;

        let stored_location =
            self.store
                .store(url, &raw.bytes)
                .await
                .map_err(|e| ImageError::Store {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        tracing::trace!("Stored image {} at {}", url, stored_location);
        Ok(ImageReference { stored_location })
    }
}

/// Lowercased extension of the URL's last path segment, if it looks like one
fn image_extension(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|url| {
            let segment = url.path_segments()?.last()?.to_string();
            let (_, extension) = segment.rsplit_once('.')?;
            let valid = !extension.is_empty()
                && extension.len() <= 5
                && extension.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| extension.to_ascii_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
