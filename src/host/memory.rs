//! In-memory content host
//!
//! Stores committed blocks as a tree and enforces the same per-request
//! limits as the real host (children per call, nesting depth, text length),
//! so tests and `--dry-run` exercise the committer and orchestrator without a
//! network. Calls are logged and failures can be injected per call kind.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

use super::errors::{HostError, HostResult};
use super::{ChildrenPage, ContentHost, CreatedPage, Parent};
use crate::blocks::{Block, BlockContent, HostBlock, TextRun, max_nesting_depth};
use crate::utils::{
    LIST_CHILDREN_PAGE_SIZE, MAX_BLOCK_NESTING, MAX_CHILDREN_PER_CALL, MAX_RICH_TEXT_RUNS,
    MAX_TEXT_CONTENT_CHARS,
};

/// Kinds of host call, for the call log and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    CreatePage,
    Append,
    List,
    Update,
}

/// One logged call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreatePage { parent: String, blocks: usize },
    Append { block_id: String, blocks: usize },
    List { block_id: String },
    Update { block_id: String },
}

impl HostCall {
    #[must_use]
    pub fn kind(&self) -> CallKind {
        match self {
            HostCall::CreatePage { .. } => CallKind::CreatePage,
            HostCall::Append { .. } => CallKind::Append,
            HostCall::List { .. } => CallKind::List,
            HostCall::Update { .. } => CallKind::Update,
        }
    }
}

/// Planned failure: after `skip` successful calls of `kind`, the next `times`
/// calls fail
#[derive(Debug, Clone)]
struct Failure {
    kind: CallKind,
    skip: usize,
    times: usize,
    transient: bool,
}

#[derive(Debug)]
struct Stored {
    /// `None` for pages
    block: Option<Block>,
    children: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<String, Stored>,
    pages: Vec<String>,
    calls: Vec<HostCall>,
    failures: Vec<Failure>,
    next_id: u64,
}

impl State {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:05}", self.next_id)
    }

    fn insert(&mut self, block: &Block) -> String {
        let id = self.mint("blk");
        let children = block.children.iter().map(|c| self.insert(c)).collect();
        let mut stored = block.clone();
        stored.children = Vec::new();
        self.nodes.insert(
            id.clone(),
            Stored {
                block: Some(stored),
                children,
            },
        );
        id
    }

    fn take_failure(&mut self, kind: CallKind) -> Option<HostError> {
        let failure = self.failures.iter_mut().find(|f| f.kind == kind && f.times > 0)?;
        if failure.skip > 0 {
            failure.skip -= 1;
            return None;
        }
        failure.times -= 1;
        Some(if failure.transient {
            HostError::Server {
                status: 503,
                message: "injected transient failure".to_string(),
            }
        } else {
            HostError::Rejected {
                status: 400,
                code: "validation_error".to_string(),
                message: "injected failure".to_string(),
            }
        })
    }

    fn rebuild(&self, id: &str) -> Option<Block> {
        let stored = self.nodes.get(id)?;
        let mut block = stored.block.clone()?;
        block.children = stored.children.iter().filter_map(|c| self.rebuild(c)).collect();
        Some(block)
    }
}

/// Content host backed by memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

fn rejected(message: String) -> HostError {
    HostError::Rejected {
        status: 400,
        code: "validation_error".to_string(),
        message,
    }
}

/// Check a request payload against the host's limits
fn validate(children: &[Block]) -> HostResult<()> {
    if children.len() > MAX_CHILDREN_PER_CALL {
        return Err(rejected(format!(
            "body.children.length should be ≤ {MAX_CHILDREN_PER_CALL}, instead was {}",
            children.len()
        )));
    }

    let depth = max_nesting_depth(children);
    if depth > MAX_BLOCK_NESTING {
        return Err(rejected(format!(
            "block nesting depth {depth} exceeds {MAX_BLOCK_NESTING}"
        )));
    }

    let mut problem = None;
    for block in children {
        block.walk(&mut |b| {
            if problem.is_some() {
                return;
            }
            if !b.children.is_empty() && !b.accepts_children() {
                problem = Some(format!("{} blocks cannot have children", b.kind()));
                return;
            }
            if b.children.len() > MAX_CHILDREN_PER_CALL {
                problem = Some(format!(
                    "{}.children.length should be ≤ {MAX_CHILDREN_PER_CALL}, instead was {}",
                    b.kind(),
                    b.children.len()
                ));
                return;
            }
            let fields: Vec<&[TextRun]> = match &b.content {
                BlockContent::Table(table) => {
                    if table.rows.len() > MAX_CHILDREN_PER_CALL {
                        problem = Some(format!("table has {} rows", table.rows.len()));
                        return;
                    }
                    table.rows.iter().flat_map(|r| r.cells.iter().map(Vec::as_slice)).collect()
                }
                _ => b.rich_text().map(Vec::as_slice).into_iter().collect(),
            };
            problem = fields.into_iter().find_map(check_rich_text);
        });
    }

    match problem {
        Some(message) => Err(rejected(message)),
        None => Ok(()),
    }
}

fn check_rich_text(rich_text: &[TextRun]) -> Option<String> {
    if rich_text.len() > MAX_RICH_TEXT_RUNS {
        return Some(format!("rich_text length {} exceeds {MAX_RICH_TEXT_RUNS}", rich_text.len()));
    }
    rich_text
        .iter()
        .find(|r| r.char_len() > MAX_TEXT_CONTENT_CHARS)
        .map(|run| format!("text.content length {} exceeds {MAX_TEXT_CONTENT_CHARS}", run.char_len()))
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `kind` once `skip` of them succeeded
    pub fn fail_calls(&self, kind: CallKind, skip: usize, times: usize, transient: bool) {
        self.state.lock().failures.push(Failure {
            kind,
            skip,
            times,
            transient,
        });
    }

    /// Create an empty page, as if it already existed on the host
    pub fn seed_page(&self) -> String {
        let mut state = self.state.lock();
        let id = state.mint("page");
        state.nodes.insert(
            id.clone(),
            Stored {
                block: None,
                children: Vec::new(),
            },
        );
        state.pages.push(id.clone());
        id
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Number of logged calls of `kind`
    pub fn count(&self, kind: CallKind) -> usize {
        self.state.lock().calls.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn pages(&self) -> Vec<String> {
        self.state.lock().pages.clone()
    }

    /// The committed tree under `id`, children included
    pub fn tree(&self, id: &str) -> Vec<Block> {
        let state = self.state.lock();
        state
            .nodes
            .get(id)
            .map(|n| n.children.iter().filter_map(|c| state.rebuild(c)).collect())
            .unwrap_or_default()
    }

    /// Ids of the direct children of `id`
    pub fn child_ids(&self, id: &str) -> Vec<String> {
        self.state
            .lock()
            .nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContentHost for MemoryHost {
    async fn create_page(
        &self,
        parent: &Parent,
        _properties: &Value,
        children: &[Block],
    ) -> HostResult<CreatedPage> {
        let mut state = self.state.lock();
        let parent_id = match parent {
            Parent::Page(id) | Parent::Database(id) => id.clone(),
        };
        state.calls.push(HostCall::CreatePage {
            parent: parent_id,
            blocks: children.len(),
        });
        if let Some(error) = state.take_failure(CallKind::CreatePage) {
            return Err(error);
        }
        validate(children)?;

        let id = state.mint("page");
        let child_ids = children.iter().map(|c| state.insert(c)).collect();
        state.nodes.insert(
            id.clone(),
            Stored {
                block: None,
                children: child_ids,
            },
        );
        state.pages.push(id.clone());

        Ok(CreatedPage {
            url: Some(format!("memory://{id}")),
            id,
        })
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> HostResult<Vec<String>> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::Append {
            block_id: block_id.to_string(),
            blocks: children.len(),
        });
        if let Some(error) = state.take_failure(CallKind::Append) {
            return Err(error);
        }
        if !state.nodes.contains_key(block_id) {
            return Err(HostError::NotFound(block_id.to_string()));
        }
        validate(children)?;

        let ids: Vec<String> = children.iter().map(|c| state.insert(c)).collect();
        if let Some(parent) = state.nodes.get_mut(block_id) {
            parent.children.extend(ids.iter().cloned());
        }
        Ok(ids)
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> HostResult<ChildrenPage> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::List {
            block_id: block_id.to_string(),
        });
        if let Some(error) = state.take_failure(CallKind::List) {
            return Err(error);
        }

        let Some(node) = state.nodes.get(block_id) else {
            return Err(HostError::NotFound(block_id.to_string()));
        };
        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| rejected(format!("invalid start_cursor {c}")))?,
            None => 0,
        };
        let end = (start + LIST_CHILDREN_PAGE_SIZE).min(node.children.len());

        let results = node.children[start.min(end)..end]
            .iter()
            .filter_map(|id| {
                let child = state.nodes.get(id)?;
                let block = child.block.as_ref()?;
                Some(HostBlock {
                    id: id.clone(),
                    kind: block.kind().to_string(),
                    has_children: !child.children.is_empty(),
                    rich_text: block.rich_text().cloned(),
                })
            })
            .collect();

        Ok(ChildrenPage {
            results,
            next_cursor: (end < node.children.len()).then(|| end.to_string()),
        })
    }

    async fn update_rich_text(&self, block_id: &str, kind: &str, rich_text: &[TextRun]) -> HostResult<()> {
        let mut state = self.state.lock();
        state.calls.push(HostCall::Update {
            block_id: block_id.to_string(),
        });
        if let Some(error) = state.take_failure(CallKind::Update) {
            return Err(error);
        }

        let block = state
            .nodes
            .get_mut(block_id)
            .and_then(|n| n.block.as_mut())
            .ok_or_else(|| HostError::NotFound(block_id.to_string()))?;
        if block.kind() != kind {
            return Err(rejected(format!("block {block_id} is not a {kind}")));
        }
        match block.rich_text_mut() {
            Some(field) => {
                *field = rich_text.to_vec();
                Ok(())
            }
            None => Err(rejected(format!("{kind} has no rich text"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::paragraph(vec![TextRun::plain(text)])
    }

    #[tokio::test]
    async fn rejects_oversized_batches() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        let blocks: Vec<Block> = (0..101).map(|i| para(&i.to_string())).collect();

        let err = host.append_children(&page, &blocks).await.unwrap_err();
        assert!(matches!(err, HostError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn rejects_deep_nesting() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        let deep = Block::bulleted(vec![TextRun::plain("a")]).with_children(vec![
            Block::bulleted(vec![TextRun::plain("b")]).with_children(vec![
                Block::bulleted(vec![TextRun::plain("c")]).with_children(vec![para("d")]),
            ]),
        ]);

        assert!(host.append_children(&page, &[deep]).await.is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_nested_children() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        let wide = Block::bulleted(vec![TextRun::plain("parent")])
            .with_children((0..150).map(|i| para(&i.to_string())).collect());

        let err = host.append_children(&page, &[wide]).await.unwrap_err();
        assert!(err.to_string().contains("children.length"));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn rejects_overlong_rich_text_anywhere() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        let runs: Vec<TextRun> = (0..120).map(|i| TextRun::plain(i.to_string())).collect();
        let item = Block::bulleted(vec![TextRun::plain("parent")])
            .with_children(vec![Block::bulleted(runs)]);

        let err = host.append_children(&page, &[item]).await.unwrap_err();
        assert!(err.to_string().contains("rich_text length 120"));
    }

    #[tokio::test]
    async fn lists_children_with_pagination() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        for chunk in 0..3 {
            let blocks: Vec<Block> = (0..50).map(|i| para(&format!("{chunk}-{i}"))).collect();
            host.append_children(&page, &blocks).await.unwrap();
        }

        let first = host.list_children(&page, None).await.unwrap();
        assert_eq!(first.results.len(), 100);
        let second = host
            .list_children(&page, first.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(second.results.len(), 50);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn injected_failures_skip_then_fail() {
        let host = MemoryHost::new();
        let page = host.seed_page();
        host.fail_calls(CallKind::Append, 1, 1, true);

        assert!(host.append_children(&page, &[para("a")]).await.is_ok());
        let err = host.append_children(&page, &[para("b")]).await.unwrap_err();
        assert!(err.is_transient());
        assert!(host.append_children(&page, &[para("c")]).await.is_ok());
        assert_eq!(host.tree(&page).len(), 2);
    }
}
