//! End-to-end document flow: convert, resolve images, commit, relocate, sweep

use tracing::Instrument;

use crate::blocks::count_blocks;
use crate::commit::{CommitError, CommitWarning, Container, commit_with_relocations};
use crate::config::Config;
use crate::converter::{Conversion, ConversionWarning, convert_html_to_blocks, resolve_media};
use crate::host::{ContentHost, ExternalImageService, ImageService, Parent};

/// Summary of one committed document
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    pub page_id: String,
    pub url: Option<String>,
    /// Blocks written, relocated content and nested children included
    pub blocks_committed: usize,
    pub calls: usize,
    pub relocations_resolved: usize,
    pub relocations_orphaned: usize,
    pub markers_stripped: usize,
    pub warnings: Vec<CommitWarning>,
    pub conversion_warnings: Vec<ConversionWarning>,
}

/// Converts HTML documents and commits them to one host
///
/// Documents are independent: one pipeline can serve several concurrent
/// `commit_document` calls.
pub struct DocumentPipeline<H, I = ExternalImageService> {
    host: H,
    images: I,
    config: Config,
}

impl<H: ContentHost> DocumentPipeline<H> {
    /// Pipeline that keeps images as external URLs
    pub fn with_external_images(host: H, config: Config) -> Self {
        Self::new(host, ExternalImageService, config)
    }
}

impl<H: ContentHost, I: ImageService> DocumentPipeline<H, I> {
    pub fn new(host: H, images: I, config: Config) -> Self {
        Self { host, images, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert `html` without touching the host
    pub fn convert(&self, html: &str) -> Conversion {
        convert_html_to_blocks(html, &self.config.conversion)
    }

    /// Convert `html` and write it into `container`
    pub async fn commit_document(&self, container: &Container, html: &str) -> Result<DocumentReport, CommitError> {
        let span = tracing::info_span!("document", container = %container_label(container));
        self.run(container, html).instrument(span).await
    }

    async fn run(&self, container: &Container, html: &str) -> Result<DocumentReport, CommitError> {
        let Conversion { mut blocks, mut warnings } = self.convert(html);

        warnings.extend(resolve_media(&mut blocks, &self.images, self.config.commit.media_concurrency).await);
        let total = count_blocks(&blocks);

        let outcome = commit_with_relocations(&self.host, container, blocks, &self.config.commit).await?;

        let report = DocumentReport {
            page_id: outcome.commit.container_id.clone(),
            url: outcome.commit.url.clone(),
            blocks_committed: total,
            calls: outcome.calls(),
            relocations_resolved: outcome.resolution.resolved,
            relocations_orphaned: outcome.resolution.orphaned,
            markers_stripped: outcome.sweep.as_ref().map_or(0, |s| s.rewritten),
            warnings: outcome.warnings(),
            conversion_warnings: warnings,
        };

        tracing::info!(
            page_id = %report.page_id,
            blocks = report.blocks_committed,
            calls = report.calls,
            relocations = report.relocations_resolved,
            orphaned = report.relocations_orphaned,
            warnings = report.warnings.len() + report.conversion_warnings.len(),
            "document committed"
        );
        Ok(report)
    }
}

fn container_label(container: &Container) -> String {
    match container {
        Container::NewPage { parent, .. } => match parent {
            Parent::Page(id) => format!("new page under {id}"),
            Parent::Database(id) => format!("new page in database {id}"),
        },
        Container::Existing(id) => id.clone(),
    }
}
