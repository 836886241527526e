//! Chunked writes of a block list
//!
//! The host accepts at most 100 children per call. A new page takes the
//! first batch in its create call; every following batch is appended to the
//! page in order. Each call is retried on transient errors, and a batch that
//! still fails stops the commit with everything before it left in place.

use serde_json::Value;

use super::errors::{CommitError, CommitResult};
use super::retry::retry_call;
use crate::blocks::Block;
use crate::config::CommitConfig;
use crate::host::{ContentHost, Parent};

/// Where blocks are written
#[derive(Debug, Clone)]
pub enum Container {
    /// Create a page under `parent` with `properties` (title etc.)
    NewPage { parent: Parent, properties: Value },
    /// Append to an existing page or block
    Existing(String),
}

/// Outcome of a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub container_id: String,
    pub url: Option<String>,
    /// Top-level blocks written
    pub appended: usize,
    /// Host calls made, retries included
    pub calls: usize,
    /// Ids returned by append calls, in order
    pub appended_ids: Vec<String>,
}

/// Writes block lists in host-sized batches
pub struct Committer<'a, H: ContentHost + ?Sized> {
    host: &'a H,
    config: &'a CommitConfig,
}

impl<'a, H: ContentHost + ?Sized> Committer<'a, H> {
    pub fn new(host: &'a H, config: &'a CommitConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &'a H {
        self.host
    }

    /// Write `blocks` into `container`
    pub async fn commit(&self, container: &Container, blocks: &[Block]) -> CommitResult<CommitReport> {
        match container {
            Container::Existing(id) => self.append(id, blocks).await,
            Container::NewPage { parent, properties } => {
                let batch = self.config.effective_batch();
                let split = blocks.len().min(batch);
                let (first, rest) = blocks.split_at(split);

                let mut calls = 0usize;
                let page = retry_call(&self.config.retry, "create_page", || {
                    calls += 1;
                    self.host.create_page(parent, properties, first)
                })
                .await
                .map_err(|source| CommitError::BatchFailed {
                    batch_index: 0,
                    committed: 0,
                    source,
                })?;

                tracing::info!(
                    page_id = %page.id,
                    blocks = blocks.len(),
                    batches = 1 + rest.len().div_ceil(batch),
                    "created page"
                );

                let mut report = CommitReport {
                    container_id: page.id,
                    url: page.url,
                    appended: first.len(),
                    calls,
                    appended_ids: Vec::new(),
                };
                self.append_batches(&mut report, rest, 1).await?;
                Ok(report)
            }
        }
    }

    /// Append `blocks` under `block_id`, one batch per call
    pub async fn append(&self, block_id: &str, blocks: &[Block]) -> CommitResult<CommitReport> {
        let mut report = CommitReport {
            container_id: block_id.to_string(),
            ..CommitReport::default()
        };
        self.append_batches(&mut report, blocks, 0).await?;
        Ok(report)
    }

    async fn append_batches(
        &self,
        report: &mut CommitReport,
        blocks: &[Block],
        first_index: usize,
    ) -> CommitResult<()> {
        let batch = self.config.effective_batch();

        for (i, chunk) in blocks.chunks(batch).enumerate() {
            let batch_index = first_index + i;
            let container = report.container_id.as_str();
            let mut calls = 0usize;

            let result = retry_call(&self.config.retry, "append_children", || {
                calls += 1;
                self.host.append_children(container, chunk)
            })
            .await;
            report.calls += calls;

            match result {
                Ok(ids) => {
                    tracing::debug!(
                        block_id = container,
                        batch = batch_index,
                        blocks = chunk.len(),
                        "appended batch"
                    );
                    report.appended += chunk.len();
                    report.appended_ids.extend(ids);
                }
                Err(source) => {
                    tracing::warn!(
                        block_id = container,
                        batch = batch_index,
                        committed = report.appended,
                        error = %source,
                        "batch failed"
                    );
                    return Err(CommitError::BatchFailed {
                        batch_index,
                        committed: report.appended,
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::TextRun;
    use crate::config::RetryConfig;
    use crate::host::MemoryHost;
    use crate::host::memory::CallKind;

    fn paragraphs(n: usize) -> Vec<Block> {
        (0..n).map(|i| Block::paragraph(vec![TextRun::plain(format!("p{i}"))])).collect()
    }

    fn config() -> CommitConfig {
        CommitConfig {
            retry: RetryConfig::immediate(3),
            ..CommitConfig::default()
        }
    }

    fn new_page() -> Container {
        Container::NewPage {
            parent: Parent::Page("parent".into()),
            properties: Value::Null,
        }
    }

    #[tokio::test]
    async fn small_documents_fit_in_the_create_call() {
        let host = MemoryHost::new();
        let config = config();
        let report = Committer::new(&host, &config).commit(&new_page(), &paragraphs(40)).await.unwrap();

        assert_eq!(report.calls, 1);
        assert_eq!(report.appended, 40);
        assert_eq!(host.tree(&report.container_id).len(), 40);
    }

    #[tokio::test]
    async fn existing_container_only_appends() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        let config = config();
        let report = Committer::new(&host, &config)
            .commit(&Container::Existing(page.clone()), &paragraphs(150))
            .await
            .unwrap();

        assert_eq!(host.count(CallKind::Append), 2);
        assert_eq!(report.appended_ids.len(), 150);
        assert_eq!(host.child_ids(&page), report.appended_ids);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let host = MemoryHost::new();
        host.fail_calls(CallKind::Append, 0, 2, true);
        let config = config();

        let report = Committer::new(&host, &config).commit(&new_page(), &paragraphs(120)).await.unwrap();

        assert_eq!(report.calls, 4);
        assert_eq!(host.tree(&report.container_id).len(), 120);
    }
}
