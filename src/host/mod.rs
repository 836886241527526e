//! Content host boundary
//!
//! Everything the committer and orchestrator need from the host goes through
//! [`ContentHost`]: create a page, append children, list children, and
//! rewrite one block's rich text. [`NotionClient`] talks to the REST API;
//! [`MemoryHost`] keeps the tree in memory for dry runs and tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::blocks::{Block, HostBlock, TextRun};

pub mod errors;
pub mod images;
pub mod memory;
pub mod notion;

pub use errors::{HostError, HostResult};
pub use images::{ExternalImageService, ImageRef, ImageService};
pub use memory::{CallKind, HostCall, MemoryHost};
pub use notion::NotionClient;

/// Parent of a newly created page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    Page(String),
    Database(String),
}

impl Parent {
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Parent::Page(id) => json!({ "page_id": id }),
            Parent::Database(id) => json!({ "database_id": id }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPage {
    pub id: String,
    pub url: Option<String>,
}

/// One page of a children listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildrenPage {
    pub results: Vec<HostBlock>,
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Create a page under `parent` holding at most one batch of `children`
    async fn create_page(
        &self,
        parent: &Parent,
        properties: &Value,
        children: &[Block],
    ) -> HostResult<CreatedPage>;

    /// Append `children` under `block_id`; returns the ids of the appended
    /// top-level blocks, in order
    async fn append_children(&self, block_id: &str, children: &[Block]) -> HostResult<Vec<String>>;

    /// One page of `block_id`'s children
    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> HostResult<ChildrenPage>;

    /// Replace the primary rich-text field of a block of type `kind`
    async fn update_rich_text(&self, block_id: &str, kind: &str, rich_text: &[TextRun]) -> HostResult<()>;
}

#[async_trait]
impl<H: ContentHost + ?Sized> ContentHost for Arc<H> {
    async fn create_page(
        &self,
        parent: &Parent,
        properties: &Value,
        children: &[Block],
    ) -> HostResult<CreatedPage> {
        (**self).create_page(parent, properties, children).await
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> HostResult<Vec<String>> {
        (**self).append_children(block_id, children).await
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> HostResult<ChildrenPage> {
        (**self).list_children(block_id, cursor).await
    }

    async fn update_rich_text(&self, block_id: &str, kind: &str, rich_text: &[TextRun]) -> HostResult<()> {
        (**self).update_rich_text(block_id, kind, rich_text).await
    }
}

/// Every child of `block_id`, following pagination cursors
pub async fn list_all_children<H: ContentHost + ?Sized>(
    host: &H,
    block_id: &str,
) -> HostResult<Vec<HostBlock>> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = host.list_children(block_id, cursor.as_deref()).await?;
        all.extend(page.results);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(all),
        }
    }
}
