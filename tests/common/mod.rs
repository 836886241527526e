//! Shared helpers for the integration tests

#![allow(dead_code)]

use serde_json::json;
use sn2n::blocks::{Block, TextRun, plain_text};
use sn2n::commit::Container;
use sn2n::config::{CommitConfig, RetryConfig};
use sn2n::host::Parent;

/// Commit settings that retry without waiting
pub fn fast_commit_config() -> CommitConfig {
    CommitConfig {
        retry: RetryConfig::immediate(3),
        ..CommitConfig::default()
    }
}

/// `count` numbered paragraphs
pub fn paragraphs(count: usize) -> Vec<Block> {
    (0..count)
        .map(|i| Block::paragraph(vec![TextRun::plain(format!("Paragraph {i}"))]))
        .collect()
}

pub fn bullet(text: &str) -> Block {
    Block::bulleted(vec![TextRun::plain(text)])
}

/// Container for a new page titled `title` under `parent`
pub fn new_page(parent: &str, title: &str) -> Container {
    Container::NewPage {
        parent: Parent::Page(parent.to_string()),
        properties: json!({ "title": { "title": [{ "text": { "content": title } }] } }),
    }
}

/// Plain text of a block's primary rich text, empty when the kind has none
pub fn text_of(block: &Block) -> String {
    block.rich_text().map(|rt| plain_text(rt)).unwrap_or_default()
}

/// Every piece of text in the tree, depth-first
pub fn all_text(blocks: &[Block]) -> Vec<String> {
    let mut out = Vec::new();
    for block in blocks {
        block.walk(&mut |b| out.push(text_of(b)));
    }
    out
}
