//! Image upload boundary

use async_trait::async_trait;

use crate::utils::is_valid_url;

/// Where a resolved image lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Uploaded to the host; referenced by upload id
    FileUpload(String),
    /// Referenced by URL
    External(String),
}

/// Turns image URLs found in HTML into something the host can display
#[async_trait]
pub trait ImageService: Send + Sync {
    /// `None` means the image cannot be used and its block is dropped
    async fn upload(&self, url: &str, alt: &str) -> Option<ImageRef>;
}

/// Keeps absolute http(s) URLs as external images, without uploading
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalImageService;

#[async_trait]
impl ImageService for ExternalImageService {
    async fn upload(&self, url: &str, _alt: &str) -> Option<ImageRef> {
        is_valid_url(url).then(|| ImageRef::External(url.to_string()))
    }
}
