//! Depth-limit orchestration
//!
//! Conversion leaves over-deep content beside the list item that should own
//! it, tagged with the item's [`RelocationId`]. Orchestration runs in three
//! passes:
//!
//! 1. **Collect** ([`collect_relocations`]): pull every tagged block out of
//!    the tree into a [`RelocationQueue`] and record where each owner sits,
//!    as an index path from the document root or from the content of another
//!    relocation.
//! 2. **Resolve** ([`Orchestrator::resolve`]): once the main tree is
//!    committed, find each owner's host id by walking its path with
//!    `list_children`, then append the queued blocks under it. Content whose
//!    owner cannot be found is appended at the document root instead.
//! 3. **Sweep** ([`Orchestrator::sweep`]): walk the committed tree and strip
//!    any `(sn2n:…)` marker token still present in rich text.

use std::collections::{HashMap, VecDeque};

use super::committer::{CommitReport, Committer, Container};
use super::errors::{CommitError, CommitResult, CommitWarning};
use super::retry::retry_call;
use crate::blocks::{Block, HostBlock, RelocationId, contains_marker, strip_marker_tokens};
use crate::config::CommitConfig;
use crate::host::{ContentHost, HostError, list_all_children};

/// Where an owner's index path starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The committed document tree
    Root,
    /// The top-level blocks appended for another relocation
    Relocation(RelocationId),
}

/// Position of a relocation owner: child indices from the anchor downwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLocation {
    pub anchor: Anchor,
    pub path: Vec<usize>,
}

/// Relocated blocks keyed by id, in discovery order, plus owner positions
#[derive(Debug, Default)]
pub struct RelocationQueue {
    entries: Vec<(RelocationId, Vec<Block>)>,
    owners: HashMap<RelocationId, OwnerLocation>,
}

impl RelocationQueue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Blocks queued for `id`
    pub fn blocks(&self, id: &RelocationId) -> Option<&[Block]> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, blocks)| blocks.as_slice())
    }

    pub fn owner(&self, id: &RelocationId) -> Option<&OwnerLocation> {
        self.owners.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &RelocationId> {
        self.entries.iter().map(|(id, _)| id)
    }

    fn push(&mut self, id: RelocationId, block: Block) {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, blocks)) => blocks.push(block),
            None => self.entries.push((id, vec![block])),
        }
    }
}

/// Remove tagged blocks from `blocks` (at any depth) into `queue`
fn extract(blocks: &mut Vec<Block>, queue: &mut RelocationQueue) {
    let mut i = 0;
    while i < blocks.len() {
        let detach = blocks[i]
            .relocate_to
            .as_ref()
            .is_some_and(|id| !blocks[i].owns.contains(id));

        if detach {
            let mut block = blocks.remove(i);
            if let Some(id) = block.relocate_to.take() {
                queue.push(id, block);
            }
        } else {
            extract(&mut blocks[i].children, queue);
            i += 1;
        }
    }
}

fn record_owners(
    blocks: &[Block],
    anchor: &Anchor,
    prefix: &mut Vec<usize>,
    owners: &mut HashMap<RelocationId, OwnerLocation>,
) {
    for (i, block) in blocks.iter().enumerate() {
        prefix.push(i);
        for id in &block.owns {
            owners.insert(
                id.clone(),
                OwnerLocation {
                    anchor: anchor.clone(),
                    path: prefix.clone(),
                },
            );
        }
        record_owners(&block.children, anchor, prefix, owners);
        prefix.pop();
    }
}

/// Pull every relocation-tagged block out of `blocks`.
///
/// Afterwards `blocks` is exactly what the first commit writes, and the
/// queue holds the relocated content (itself free of tags) with each owner's
/// location.
pub fn collect_relocations(blocks: &mut Vec<Block>) -> RelocationQueue {
    let mut queue = RelocationQueue::default();
    extract(blocks, &mut queue);

    // Relocated content may hold tagged blocks of its own
    let mut k = 0;
    while k < queue.entries.len() {
        let mut entry = std::mem::take(&mut queue.entries[k].1);
        extract(&mut entry, &mut queue);
        let late = std::mem::replace(&mut queue.entries[k].1, entry);
        queue.entries[k].1.extend(late);
        k += 1;
    }

    let mut owners = HashMap::new();
    record_owners(blocks, &Anchor::Root, &mut Vec::new(), &mut owners);
    for (id, entry) in &queue.entries {
        record_owners(entry, &Anchor::Relocation(id.clone()), &mut Vec::new(), &mut owners);
    }
    queue.owners = owners;

    if !queue.is_empty() {
        tracing::debug!(relocations = queue.len(), "collected relocated content");
    }
    queue
}

/// Outcome of relocation resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Relocations placed under their owner
    pub resolved: usize,
    /// Relocations appended at the document root instead
    pub orphaned: usize,
    pub calls: usize,
    pub warnings: Vec<CommitWarning>,
}

/// Outcome of the marker sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub scanned: usize,
    pub rewritten: usize,
    pub warnings: Vec<CommitWarning>,
}

/// Resolves queued relocations against a committed document
pub struct Orchestrator<'a, H: ContentHost + ?Sized> {
    committer: Committer<'a, H>,
    config: &'a CommitConfig,
    /// Children listings already fetched, by parent id
    listings: HashMap<String, Vec<HostBlock>>,
    /// Ids of the top-level blocks appended for each relocation
    placed: HashMap<RelocationId, Vec<String>>,
    /// Ids of the committed document's top-level blocks, when the container
    /// held other children before the commit
    root_ids: Option<Vec<String>>,
    calls: usize,
}

impl<'a, H: ContentHost + ?Sized> Orchestrator<'a, H> {
    pub fn new(host: &'a H, config: &'a CommitConfig) -> Self {
        Self {
            committer: Committer::new(host, config),
            config,
            listings: HashMap::new(),
            placed: HashMap::new(),
            root_ids: None,
            calls: 0,
        }
    }

    /// Resolve root owner paths against these block ids instead of the
    /// container's children listing
    #[must_use]
    pub fn with_root_ids(mut self, ids: Vec<String>) -> Self {
        self.root_ids = Some(ids);
        self
    }

    /// Children of `parent`, fetched once
    async fn children_of(&mut self, parent: &str) -> Result<&[HostBlock], HostError> {
        if !self.listings.contains_key(parent) {
            let host = self.committer.host();
            let mut calls = 0usize;
            let listing = retry_call(&self.config.retry, "list_children", || {
                calls += 1;
                list_all_children(host, parent)
            })
            .await;
            self.calls += calls;
            self.listings.insert(parent.to_string(), listing?);
        }
        Ok(self.listings.get(parent).map(Vec::as_slice).unwrap_or_default())
    }

    /// Host id of the owner at `location`, or why it cannot be found
    async fn locate(&mut self, root_id: &str, location: &OwnerLocation) -> Result<String, String> {
        let (first, rest) = location
            .path
            .split_first()
            .ok_or_else(|| "empty owner path".to_string())?;

        let mut current = match &location.anchor {
            Anchor::Root => match &self.root_ids {
                Some(ids) => ids
                    .get(*first)
                    .cloned()
                    .ok_or_else(|| format!("commit wrote no block {first}"))?,
                None => {
                    let children = self.children_of(root_id).await.map_err(|e| e.to_string())?;
                    children
                        .get(*first)
                        .map(|b| b.id.clone())
                        .ok_or_else(|| format!("document root has no child {first}"))?
                }
            },
            Anchor::Relocation(parent) => self
                .placed
                .get(parent)
                .and_then(|ids| ids.get(*first))
                .cloned()
                .ok_or_else(|| format!("{parent} has no placed block {first}"))?,
        };

        for index in rest {
            let children = self.children_of(&current).await.map_err(|e| e.to_string())?;
            current = children
                .get(*index)
                .map(|b| b.id.clone())
                .ok_or_else(|| format!("block {current} has no child {index}"))?;
        }
        Ok(current)
    }

    /// Append every queued relocation under its owner in `root_id`'s tree.
    ///
    /// Relocations whose owner lives in another relocation wait until that
    /// one has been placed. Failing that, content goes to the document root
    /// with a warning; only a failed root append is an error.
    pub async fn resolve(&mut self, root_id: &str, queue: RelocationQueue) -> CommitResult<ResolutionReport> {
        let RelocationQueue { entries, owners } = queue;
        let mut report = ResolutionReport::default();
        let mut pending: VecDeque<(RelocationId, Vec<Block>)> = entries.into();
        let mut stalled = 0usize;

        while let Some((id, blocks)) = pending.pop_front() {
            let location = owners.get(&id).cloned();

            if let Some(OwnerLocation {
                anchor: Anchor::Relocation(parent),
                ..
            }) = &location
                && !self.placed.contains_key(parent)
                && pending.iter().any(|(p, _)| p == parent)
                && stalled <= pending.len()
            {
                stalled += 1;
                pending.push_back((id, blocks));
                continue;
            }
            stalled = 0;

            let target = match &location {
                Some(location) => self.locate(root_id, location).await,
                None => Err("owner not found in converted tree".to_string()),
            };

            let ids = match target {
                Ok(owner_id) => match self.committer.append(&owner_id, &blocks).await {
                    Ok(appended) => {
                        self.calls += appended.calls;
                        tracing::debug!(relocation = %id, owner = %owner_id, blocks = blocks.len(), "relocated content attached");
                        report.resolved += 1;
                        appended.appended_ids
                    }
                    Err(e) => {
                        let committed = e.committed();
                        let mut ids = self.placed_prefix(&owner_id, committed).await;
                        let rest = self
                            .orphan(root_id, &id, &blocks[committed..], e.to_string(), &mut report)
                            .await?;
                        ids.extend(rest);
                        ids
                    }
                },
                Err(reason) => self.orphan(root_id, &id, &blocks, reason, &mut report).await?,
            };
            self.placed.insert(id, ids);
        }

        report.calls = self.calls;
        Ok(report)
    }

    /// Ids of the last `count` children of `owner_id`, after a partial append
    async fn placed_prefix(&mut self, owner_id: &str, count: usize) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }
        self.listings.remove(owner_id);
        match self.children_of(owner_id).await {
            Ok(children) => children
                .iter()
                .skip(children.len().saturating_sub(count))
                .map(|b| b.id.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn orphan(
        &mut self,
        root_id: &str,
        id: &RelocationId,
        blocks: &[Block],
        reason: String,
        report: &mut ResolutionReport,
    ) -> CommitResult<Vec<String>> {
        tracing::warn!(relocation = %id, blocks = blocks.len(), reason = %reason, "appending relocated content at document root");
        let appended = self.committer.append(root_id, blocks).await.map_err(|e| match e {
            CommitError::BatchFailed { source, .. } | CommitError::RelocationFailed { source, .. } => {
                CommitError::RelocationFailed {
                    relocation: id.clone(),
                    source,
                }
            }
        })?;
        self.calls += appended.calls;
        report.orphaned += 1;
        report.warnings.push(CommitWarning::OrphanedRelocation {
            relocation: id.clone(),
            blocks: blocks.len(),
            reason,
        });
        Ok(appended.appended_ids)
    }

    /// Strip leftover marker tokens from every block under `root_id`
    pub async fn sweep(&mut self, root_id: &str) -> SweepReport {
        let mut report = SweepReport::default();
        let host = self.committer.host();
        let mut queue = VecDeque::from([root_id.to_string()]);

        while let Some(parent) = queue.pop_front() {
            let children = match list_all_children(host, &parent).await {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!(block_id = %parent, error = %e, "marker sweep could not list children");
                    report.warnings.push(CommitWarning::SweepFailed {
                        block_id: parent,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for block in children {
                report.scanned += 1;

                if let Some(rich_text) = &block.rich_text
                    && contains_marker(rich_text)
                    && let Some(cleaned) = strip_marker_tokens(rich_text)
                {
                    let result = retry_call(&self.config.retry, "update_rich_text", || {
                        host.update_rich_text(&block.id, &block.kind, &cleaned)
                    })
                    .await;
                    match result {
                        Ok(()) => report.rewritten += 1,
                        Err(e) => report.warnings.push(CommitWarning::SweepFailed {
                            block_id: block.id.clone(),
                            reason: e.to_string(),
                        }),
                    }
                }

                if block.has_children && !matches!(block.kind.as_str(), "child_page" | "child_database") {
                    queue.push_back(block.id);
                }
            }
        }

        if report.rewritten > 0 {
            tracing::info!(rewritten = report.rewritten, "removed leftover marker tokens");
        }
        report
    }
}

/// Everything a document commit did
#[derive(Debug, Clone, Default)]
pub struct OrchestrationReport {
    pub commit: CommitReport,
    pub resolution: ResolutionReport,
    pub sweep: Option<SweepReport>,
}

impl OrchestrationReport {
    /// Host calls made by the main commit and relocation passes
    #[must_use]
    pub fn calls(&self) -> usize {
        self.commit.calls + self.resolution.calls
    }

    pub fn warnings(&self) -> Vec<CommitWarning> {
        let mut all = self.resolution.warnings.clone();
        if let Some(sweep) = &self.sweep {
            all.extend(sweep.warnings.iter().cloned());
        }
        all
    }
}

/// Collect relocations, commit the tree, resolve relocations, then sweep
pub async fn commit_with_relocations<H: ContentHost + ?Sized>(
    host: &H,
    container: &Container,
    mut blocks: Vec<Block>,
    config: &CommitConfig,
) -> CommitResult<OrchestrationReport> {
    let queue = collect_relocations(&mut blocks);
    let commit = Committer::new(host, config).commit(container, &blocks).await?;

    let mut orchestrator = Orchestrator::new(host, config);
    if let Container::Existing(_) = container {
        orchestrator = orchestrator.with_root_ids(commit.appended_ids.clone());
    }
    let resolution = if queue.is_empty() {
        ResolutionReport::default()
    } else {
        orchestrator.resolve(&commit.container_id, queue).await?
    };
    let sweep = if config.final_sweep {
        Some(orchestrator.sweep(&commit.container_id).await)
    } else {
        None
    };

    Ok(OrchestrationReport {
        commit,
        resolution,
        sweep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::TextRun;

    fn item(text: &str) -> Block {
        Block::bulleted(vec![TextRun::plain(text)])
    }

    #[test]
    fn collection_removes_tagged_blocks_and_records_owner_paths() {
        let id = RelocationId::from_raw("r1");
        let mut middle = item("middle");
        middle.owns.push(id.clone());
        let mut deep = item("deep");
        deep.relocate_to = Some(id.clone());

        let mut blocks = vec![item("outer").with_children(vec![middle, deep])];
        let queue = collect_relocations(&mut blocks);

        assert_eq!(blocks[0].children.len(), 1);
        assert_eq!(queue.blocks(&id).unwrap().len(), 1);
        assert!(queue.blocks(&id).unwrap()[0].relocate_to.is_none());
        assert_eq!(
            queue.owner(&id),
            Some(&OwnerLocation {
                anchor: Anchor::Root,
                path: vec![0, 0],
            })
        );
    }

    #[test]
    fn nested_relocations_anchor_on_their_parent() {
        let outer_id = RelocationId::from_raw("outer");
        let inner_id = RelocationId::from_raw("inner");

        let mut owner = item("owner");
        owner.owns.push(outer_id.clone());

        let mut relocated_owner = item("relocated owner");
        relocated_owner.relocate_to = Some(outer_id.clone());
        relocated_owner.owns.push(inner_id.clone());
        let mut inner = item("inner");
        inner.relocate_to = Some(inner_id.clone());

        let mut blocks = vec![owner, relocated_owner, inner];
        let queue = collect_relocations(&mut blocks);

        assert_eq!(blocks.len(), 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.owner(&inner_id).map(|o| &o.anchor),
            Some(&Anchor::Relocation(outer_id.clone()))
        );
    }

    #[test]
    fn owner_keeps_its_own_tag() {
        let id = RelocationId::from_raw("self");
        let mut block = item("owner");
        block.owns.push(id.clone());
        block.relocate_to = Some(id);

        let mut blocks = vec![block];
        let queue = collect_relocations(&mut blocks);

        assert_eq!(blocks.len(), 1);
        assert!(queue.is_empty());
    }
}
