//! `<ul>`/`<ol>` → list item blocks, within the host's nesting ceiling
//!
//! `depth` counts list nesting (0 for a top-level list) and `level` the block
//! nesting the items will sit at. A nested list is kept as item children
//! while `depth + 1 < max_list_depth`; beyond that it is converted afresh at
//! depth 0 and tagged for relocation under the item that owns it. The
//! relocated blocks travel as siblings right after their owner until the
//! committer moves them.

use ego_tree::NodeRef;
use scraper::ElementRef;
use scraper::node::Node;

use super::dom::{has_block_descendant, is_block_node, is_ignorable, tag_name};
use super::inline::{InlineMode, compile_element, compile_nodes};
use super::segmenter::{convert_nodes, image_blocks, paragraphs};
use super::{ConversionContext, attach_children, owner_relocation};
use crate::blocks::Block;
use crate::blocks::rich_text::{is_blank, split_at_run_limit};
use crate::utils::MAX_BLOCK_NESTING;

/// One entry of a list: an `li`, plus lists written directly after it
/// (`<ul><li>a</li><ul>…</ul></ul>`), which belong to that item
enum Entry<'a> {
    Item {
        li: ElementRef<'a>,
        stray: Vec<ElementRef<'a>>,
    },
    Other(NodeRef<'a, Node>),
}

fn is_list(node: &NodeRef<'_, Node>) -> bool {
    matches!(tag_name(node), Some("ul" | "ol"))
}

/// Convert a list element into item blocks (plus any relocated overflow)
pub fn build_list(
    list: ElementRef<'_>,
    depth: usize,
    level: usize,
    ctx: &mut ConversionContext<'_>,
) -> Vec<Block> {
    let ordered = list.value().name() == "ol";
    if ordered && let Some(start) = list.attr("start") {
        tracing::debug!(start, "ordered list start attribute kept as numbering hint only");
    }

    let mut entries: Vec<Entry<'_>> = Vec::new();
    for child in list.children() {
        if is_ignorable(&child) {
            continue;
        }
        if tag_name(&child) == Some("li") {
            if let Some(li) = ElementRef::wrap(child) {
                entries.push(Entry::Item { li, stray: Vec::new() });
            }
            continue;
        }
        if is_list(&child)
            && let Some(Entry::Item { stray, .. }) = entries.last_mut()
            && let Some(el) = ElementRef::wrap(child)
        {
            stray.push(el);
            continue;
        }
        entries.push(Entry::Other(child));
    }

    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Entry::Item { li, stray } => {
                out.extend(build_item(li, &stray, ordered, depth, level, ctx));
            }
            Entry::Other(node) => match ElementRef::wrap(node).filter(|_| is_list(&node)) {
                Some(nested) => out.extend(build_list(nested, depth, level, ctx)),
                None => out.extend(convert_nodes([node], ctx, level)),
            },
        }
    }
    out
}

/// Whether a first child can stand in for an item's missing text
fn promotable(node: &NodeRef<'_, Node>) -> bool {
    match tag_name(node) {
        Some("p") => true,
        Some("div" | "span") => !has_block_descendant(node),
        _ => false,
    }
}

/// Convert one `li` into its item block followed by relocated overflow
pub(crate) fn build_item(
    li: ElementRef<'_>,
    stray: &[ElementRef<'_>],
    ordered: bool,
    depth: usize,
    level: usize,
    ctx: &mut ConversionContext<'_>,
) -> Vec<Block> {
    let nodes: Vec<NodeRef<'_, Node>> = li.children().collect();
    let lead_len = nodes.iter().take_while(|n| !is_block_node(n)).count();

    let lead = compile_nodes(nodes[..lead_len].iter().copied(), &ctx.inline(InlineMode::Collapse));
    let mut rich_text = lead.rich_text;
    let mut media = lead.media;
    let mut rest = &nodes[lead_len..];

    if is_blank(&rich_text)
        && let Some(first) = rest.iter().position(|n| !is_ignorable(n))
        && promotable(&rest[first])
        && let Some(el) = ElementRef::wrap(rest[first])
    {
        let promoted = compile_element(el, &ctx.inline(InlineMode::Collapse));
        rich_text = promoted.rich_text;
        media.extend(promoted.media);
        rest = &rest[first + 1..];
    }

    let (rich_text, continued) = split_at_run_limit(rich_text);
    let mut item = Block::list_item(ordered, rich_text);
    let mut children = paragraphs(continued);
    children.extend(image_blocks(media, ctx));
    let mut pending: Vec<NodeRef<'_, Node>> = Vec::new();

    let tail = rest.iter().copied().chain(stray.iter().map(|el| **el));
    for node in tail {
        match ElementRef::wrap(node).filter(|_| is_list(&node)) {
            Some(nested) => {
                children.extend(convert_nodes(pending.drain(..), ctx, level + 1));
                children.extend(nested_list(&mut item, nested, depth, level, ctx));
            }
            None => pending.push(node),
        }
    }
    children.extend(convert_nodes(pending, ctx, level + 1));

    let overflow = attach_children(&mut item, children, level);
    let mut out = Vec::with_capacity(1 + overflow.len());
    out.push(item);
    out.extend(overflow);
    out
}

/// A list nested inside `item`: kept as children while it fits, otherwise
/// converted from scratch and tagged for relocation under `item`
fn nested_list(
    item: &mut Block,
    list: ElementRef<'_>,
    depth: usize,
    level: usize,
    ctx: &mut ConversionContext<'_>,
) -> Vec<Block> {
    if depth + 1 < ctx.options.max_list_depth && level < MAX_BLOCK_NESTING {
        return build_list(list, depth + 1, level + 1, ctx);
    }

    let id = owner_relocation(item);
    let mut blocks = build_list(list, 0, 0, ctx);
    for block in &mut blocks {
        if block.relocate_to.is_none() {
            block.relocate_to = Some(id.clone());
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use crate::blocks::{Block, max_nesting_depth, plain_text};
    use crate::converter::{ConversionOptions, convert_html_to_blocks};
    use crate::utils::{MAX_CHILDREN_PER_CALL, MAX_RICH_TEXT_RUNS};

    fn kinds(blocks: &[Block]) -> Vec<&'static str> {
        blocks.iter().map(Block::kind).collect()
    }

    fn convert(html: &str) -> Vec<Block> {
        convert_html_to_blocks(html, &ConversionOptions::default()).blocks
    }

    fn text(block: &Block) -> String {
        plain_text(block.rich_text().map(Vec::as_slice).unwrap_or_default())
    }

    #[test]
    fn flat_list_items() {
        let blocks = convert("<ol><li>one</li><li>two</li></ol>");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.kind() == "numbered_list_item"));
        assert_eq!(text(&blocks[1]), "two");
    }

    #[test]
    fn two_levels_nest_in_place() {
        let blocks = convert("<ul><li>outer<ul><li>inner</li></ul></li></ul>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(text(&blocks[0].children[0]), "inner");
        assert!(blocks[0].owns.is_empty());
    }

    #[test]
    fn third_level_is_tagged_for_relocation() {
        let blocks = convert(
            "<ul><li>outer<ul><li>middle<ul><li>deep</li></ul></li></ul></li></ul>",
        );

        assert_eq!(blocks.len(), 1);
        let outer = &blocks[0];
        assert_eq!(outer.children.len(), 2);

        let middle = &outer.children[0];
        let relocated = &outer.children[1];
        assert_eq!(text(middle), "middle");
        assert!(middle.children.is_empty());
        assert_eq!(middle.owns.len(), 1);
        assert_eq!(text(relocated), "deep");
        assert_eq!(relocated.relocate_to.as_ref(), Some(&middle.owns[0]));
        assert!(max_nesting_depth(&blocks) <= 2);
    }

    #[test]
    fn first_paragraph_is_promoted() {
        let blocks = convert("<ul><li><p>Title</p><p>Body</p></li></ul>");
        assert_eq!(text(&blocks[0]), "Title");
        assert_eq!(blocks[0].children[0].kind(), "paragraph");
        assert_eq!(text(&blocks[0].children[0]), "Body");
    }

    #[test]
    fn stray_nested_list_attaches_to_previous_item() {
        let blocks = convert("<ul><li>a</li><ul><li>b</li></ul></ul>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(text(&blocks[0].children[0]), "b");
    }

    #[test]
    fn long_styled_item_text_continues_in_child_paragraphs() {
        let styled: String = (0..120).map(|i| format!("<b>b{i}</b><i>i{i}</i>")).collect();
        let blocks = convert(&format!("<ul><li>{styled}<ul><li>sub</li></ul></li></ul>"));

        assert_eq!(blocks.len(), 1);
        let item = &blocks[0];
        assert_eq!(item.rich_text().unwrap().len(), MAX_RICH_TEXT_RUNS);
        assert_eq!(kinds(&item.children), vec!["paragraph", "paragraph", "bulleted_list_item"]);
        assert_eq!(item.children[0].rich_text().unwrap().len(), 100);
        assert_eq!(item.children[1].rich_text().unwrap().len(), 40);
        assert!(text(&item.children[1]).ends_with("b119i119"));
        assert_eq!(text(&item.children[2]), "sub");
    }

    #[test]
    fn wide_nested_list_keeps_at_most_one_call_of_children() {
        let subs: String = (0..150).map(|i| format!("<li>s{i}</li>")).collect();
        let blocks = convert(&format!("<ul><li>Parent<ul>{subs}</ul></li><li>Next</li></ul>"));

        let parent = &blocks[0];
        assert_eq!(parent.children.len(), MAX_CHILDREN_PER_CALL);
        assert_eq!(parent.owns.len(), 1);
        assert_eq!(text(&parent.children[99]), "s99");

        let overflow: Vec<&Block> = blocks[1..]
            .iter()
            .take_while(|b| b.relocate_to.as_ref() == Some(&parent.owns[0]))
            .collect();
        assert_eq!(overflow.len(), 50);
        assert_eq!(text(overflow[0]), "s100");
        assert_eq!(text(blocks.last().unwrap()), "Next");
    }

    #[test]
    fn code_inside_item_becomes_child() {
        let blocks = convert("<ul><li>Run:<pre>make all</pre></li></ul>");
        assert_eq!(blocks[0].children[0].kind(), "code");
    }
}
