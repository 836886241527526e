//! Image resolution between conversion and commit
//!
//! Conversion leaves images as `Pending` with their source URL. Before the
//! blocks are written, each distinct URL goes through the [`ImageService`]
//! once, with a bounded number of uploads in flight.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;

use super::ConversionWarning;
use crate::blocks::{Block, BlockContent, ImageSource};
use crate::host::{ImageRef, ImageService};

fn pending_images(blocks: &[Block], out: &mut Vec<(String, String)>) {
    for block in blocks {
        block.walk(&mut |b| {
            if let BlockContent::Image(image) = &b.content
                && let ImageSource::Pending { url } = &image.source
                && !out.iter().any(|(u, _)| u == url)
            {
                out.push((url.clone(), image.alt.clone()));
            }
        });
    }
}

/// Finalise or drop every pending image block in `blocks`
fn apply(
    blocks: &mut Vec<Block>,
    resolved: &HashMap<String, Option<ImageRef>>,
    warnings: &mut Vec<ConversionWarning>,
) {
    blocks.retain_mut(|block| {
        if let BlockContent::Image(image) = &mut block.content
            && let ImageSource::Pending { url } = &image.source
        {
            match resolved.get(url).cloned().flatten() {
                Some(ImageRef::FileUpload(id)) => image.source = ImageSource::FileUpload { id },
                Some(ImageRef::External(url)) => image.source = ImageSource::External { url },
                None => {
                    tracing::warn!(src = %url, "image could not be uploaded, dropping block");
                    warnings.push(ConversionWarning::DroppedImage {
                        src: url.clone(),
                        reason: "image service returned no usable source".to_string(),
                    });
                    return false;
                }
            }
        }
        apply(&mut block.children, resolved, warnings);
        true
    });
}

/// Upload every pending image in `blocks` with at most `concurrency`
/// uploads in flight; images the service rejects are dropped
pub async fn resolve_media<I: ImageService + ?Sized>(
    blocks: &mut Vec<Block>,
    images: &I,
    concurrency: usize,
) -> Vec<ConversionWarning> {
    let mut pending = Vec::new();
    pending_images(blocks, &mut pending);
    if pending.is_empty() {
        return Vec::new();
    }

    tracing::debug!(images = pending.len(), concurrency, "resolving images");

    let resolved: HashMap<String, Option<ImageRef>> = stream::iter(pending)
        .map(|(url, alt)| async move {
            let image = images.upload(&url, &alt).await;
            (url, image)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut warnings = Vec::new();
    apply(blocks, &resolved, &mut warnings);
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Image, TextRun};
    use crate::host::ExternalImageService;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pending(url: &str) -> Block {
        Block::image(Image {
            source: ImageSource::Pending { url: url.into() },
            alt: String::new(),
            caption: Vec::new(),
        })
    }

    struct CountingUploads(AtomicUsize);

    #[async_trait]
    impl ImageService for CountingUploads {
        async fn upload(&self, url: &str, _alt: &str) -> Option<ImageRef> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            (!url.contains("broken")).then(|| ImageRef::FileUpload(format!("upload-{n}")))
        }
    }

    #[tokio::test]
    async fn external_service_finalises_images() {
        let mut blocks = vec![pending("https://example.com/a.png")];
        let warnings = resolve_media(&mut blocks, &ExternalImageService, 4).await;

        assert!(warnings.is_empty());
        match &blocks[0].content {
            BlockContent::Image(image) => assert_eq!(
                image.source,
                ImageSource::External { url: "https://example.com/a.png".into() }
            ),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_urls_upload_once_and_failures_drop_blocks() {
        let service = CountingUploads(AtomicUsize::new(0));
        let item = Block::bulleted(vec![TextRun::plain("item")])
            .with_children(vec![pending("https://example.com/a.png"), pending("https://example.com/broken.png")]);
        let mut blocks = vec![pending("https://example.com/a.png"), item];

        let warnings = resolve_media(&mut blocks, &service, 2).await;

        assert_eq!(service.0.load(Ordering::SeqCst), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(blocks[1].children.len(), 1);
    }
}
