//! Block segmentation: walks the body and emits one block per block element
//!
//! Consecutive inline nodes are buffered and flushed as a paragraph whenever
//! a block element interrupts them. Wrappers without a block meaning of their
//! own (`div`, `section`, `span` around blocks, …) are transparent.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use super::callout::match_callout;
use super::code_language::detect_language;
use super::dom::{
    child_elements, has_block_descendant, is_block_tag, is_ignorable, is_skipped_tag, parse_body,
    raw_text,
};
use super::inline::{InlineMode, MediaRef, compile_element, compile_nodes};
use super::list::{build_item, build_list};
use super::placeholders::protect_placeholders;
use super::table::build_table;
use super::{
    Conversion, ConversionContext, ConversionOptions, ConversionWarning, attach_children,
};
use crate::blocks::rich_text::{is_blank, rich_text_from_str, split_at_run_limit};
use crate::blocks::{Block, HeadingLevel, Image, ImageSource, RichText, count_blocks};
use crate::utils::{MAX_RICH_TEXT_RUNS, is_valid_url};

/// Convert an HTML document or fragment into blocks.
///
/// Never fails: unusable content is dropped and reported as a warning.
pub fn convert_html_to_blocks(html: &str, options: &ConversionOptions) -> Conversion {
    let protected = protect_placeholders(html);
    let document = Html::parse_document(&protected);
    let mut ctx = ConversionContext::new(options);

    let blocks = match parse_body(&document) {
        Some(body) => convert_nodes(body.children(), &mut ctx, 0),
        None => Vec::new(),
    };

    tracing::debug!(
        top_level = blocks.len(),
        total = count_blocks(&blocks),
        warnings = ctx.warnings.len(),
        "converted html to blocks"
    );

    Conversion {
        blocks,
        warnings: ctx.warnings,
    }
}

/// Whether `node` starts a block of its own in block context
fn starts_block(node: &NodeRef<'_, Node>) -> bool {
    let Node::Element(el) = node.value() else {
        return false;
    };
    let name = el.name();
    is_block_tag(name)
        || matches!(name, "li" | "dd" | "dt" | "summary" | "figcaption")
        || has_block_descendant(node)
}

/// Convert sibling nodes that will sit at nesting `level`
pub(crate) fn convert_nodes<'a>(
    nodes: impl IntoIterator<Item = NodeRef<'a, Node>>,
    ctx: &mut ConversionContext<'_>,
    level: usize,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut inline: Vec<NodeRef<'a, Node>> = Vec::new();

    for node in nodes {
        if let Node::Element(el) = node.value()
            && is_skipped_tag(el.name())
        {
            continue;
        }
        if inline.is_empty() && is_ignorable(&node) {
            continue;
        }

        match ElementRef::wrap(node) {
            Some(el) if starts_block(&node) => {
                blocks.extend(flush_inline(std::mem::take(&mut inline), ctx));
                blocks.extend(convert_element(el, ctx, level));
            }
            _ => inline.push(node),
        }
    }

    blocks.extend(flush_inline(inline, ctx));
    blocks
}

fn flush_inline(nodes: Vec<NodeRef<'_, Node>>, ctx: &mut ConversionContext<'_>) -> Vec<Block> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let compiled = compile_nodes(nodes, &ctx.inline(InlineMode::Collapse));
    let mut blocks = paragraphs(compiled.rich_text);
    blocks.extend(image_blocks(compiled.media, ctx));
    blocks
}

/// One paragraph per `MAX_RICH_TEXT_RUNS` runs; nothing for blank text
pub(crate) fn paragraphs(rich_text: RichText) -> Vec<Block> {
    if is_blank(&rich_text) {
        return Vec::new();
    }
    rich_text
        .chunks(MAX_RICH_TEXT_RUNS)
        .map(|chunk| Block::paragraph(chunk.to_vec()))
        .collect()
}

/// Convert one block-level element at nesting `level`
pub(crate) fn convert_element(
    el: ElementRef<'_>,
    ctx: &mut ConversionContext<'_>,
    level: usize,
) -> Vec<Block> {
    let name = el.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let rank = name[1..].parse::<u8>().unwrap_or(3);
            heading(el, HeadingLevel::from_rank(rank), ctx)
        }
        "p" => {
            let compiled = compile_element(el, &ctx.inline(InlineMode::Collapse));
            let mut blocks = paragraphs(compiled.rich_text);
            blocks.extend(image_blocks(compiled.media, ctx));
            blocks
        }
        "ul" | "ol" => build_list(el, 0, level, ctx),
        "li" => build_item(el, &[], false, 0, level, ctx),
        "table" => {
            let out = build_table(el, ctx);
            let mut blocks = paragraphs(out.caption);
            blocks.extend(image_blocks(out.caption_media, ctx));
            blocks.extend(out.blocks);
            blocks.extend(image_blocks(out.media, ctx));
            blocks
        }
        "pre" => code_block(el, ctx),
        "blockquote" => match match_callout(&el, &ctx.options.callout_styles) {
            Some(style) => {
                let (icon, color) = (style.icon.clone(), style.color);
                framed(el, ctx, level, |rt| Block::callout(rt, icon.clone(), color))
            }
            None => framed(el, ctx, level, Block::quote),
        },
        "hr" => vec![Block::divider()],
        "img" => {
            let src = el.attr("src").or_else(|| el.attr("data-src")).unwrap_or_default();
            let alt = el.attr("alt").unwrap_or_default();
            image_block(src, alt, Vec::new(), ctx).into_iter().collect()
        }
        "figure" => figure(el, ctx, level),
        "iframe" | "video" | "embed" | "object" => embed(el, ctx),
        "details" => toggle(el, ctx, level),
        "dl" => definition_list(el, ctx, level),
        "summary" | "dt" => {
            let compiled = compile_element(el, &ctx.inline(InlineMode::Collapse));
            paragraphs(compiled.rich_text)
        }
        _ => {
            if let Some(style) = match_callout(&el, &ctx.options.callout_styles) {
                let (icon, color) = (style.icon.clone(), style.color);
                return framed(el, ctx, level, |rt| Block::callout(rt, icon.clone(), color));
            }
            if !has_block_descendant(&el) {
                let compiled = compile_element(el, &ctx.inline(InlineMode::Collapse));
                let mut blocks = paragraphs(compiled.rich_text);
                blocks.extend(image_blocks(compiled.media, ctx));
                return blocks;
            }
            convert_nodes(el.children(), ctx, level)
        }
    }
}

fn heading(el: ElementRef<'_>, level: HeadingLevel, ctx: &mut ConversionContext<'_>) -> Vec<Block> {
    let compiled = compile_element(el, &ctx.inline(InlineMode::Collapse));
    let mut blocks = Vec::new();
    if !is_blank(&compiled.rich_text) {
        let (head, rest) = split_at_run_limit(compiled.rich_text);
        blocks.push(Block::heading(level, head));
        blocks.extend(paragraphs(rest));
    }
    blocks.extend(image_blocks(compiled.media, ctx));
    blocks
}

fn code_block(pre: ElementRef<'_>, ctx: &mut ConversionContext<'_>) -> Vec<Block> {
    let text = raw_text(*pre);
    let text = text.trim_matches('\n');
    if text.trim().is_empty() {
        ctx.warn(ConversionWarning::DroppedBlock {
            kind: "code",
            reason: "empty code block".to_string(),
        });
        return Vec::new();
    }
    let language = detect_language(&pre, text);
    vec![Block::code(rich_text_from_str(text), language)]
}

/// Quote or callout: text (lists rendered as bullet lines) goes in the
/// block, tables, code and images follow it as siblings
fn framed(
    el: ElementRef<'_>,
    ctx: &mut ConversionContext<'_>,
    level: usize,
    make: impl Fn(RichText) -> Block,
) -> Vec<Block> {
    let mut text_nodes = Vec::new();
    let mut after = Vec::new();

    for child in el.children() {
        match ElementRef::wrap(child) {
            Some(c) if matches!(c.value().name(), "table" | "pre" | "img" | "figure") => {
                after.extend(convert_element(c, ctx, level));
            }
            _ => text_nodes.push(child),
        }
    }

    let compiled = compile_nodes(text_nodes, &ctx.inline(InlineMode::Newlines));
    let (head, rest) = split_at_run_limit(compiled.rich_text);

    let mut blocks = Vec::new();
    if !is_blank(&head) {
        blocks.push(make(head));
    }
    blocks.extend(paragraphs(rest));
    blocks.extend(image_blocks(compiled.media, ctx));
    blocks.extend(after);
    blocks
}

fn figure(el: ElementRef<'_>, ctx: &mut ConversionContext<'_>, level: usize) -> Vec<Block> {
    let caption = child_elements(*el, &["figcaption"])
        .next()
        .map(|c| compile_element(c, &ctx.inline(InlineMode::Collapse)).rich_text)
        .unwrap_or_default();

    let img = el
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|d| d.value().name() == "img");

    match img {
        Some(img) => {
            let src = img.attr("src").or_else(|| img.attr("data-src")).unwrap_or_default();
            let alt = img.attr("alt").unwrap_or_default();
            let (head, rest) = split_at_run_limit(caption);
            match image_block(src, alt, head.clone(), ctx) {
                Some(block) => {
                    let mut blocks = vec![block];
                    blocks.extend(paragraphs(rest));
                    blocks
                }
                None => {
                    let mut blocks = paragraphs(head);
                    blocks.extend(paragraphs(rest));
                    blocks
                }
            }
        }
        None => {
            let children = el
                .children()
                .filter(|c| !matches!(c.value(), Node::Element(e) if e.name() == "figcaption"));
            let mut blocks = convert_nodes(children, ctx, level);
            blocks.extend(paragraphs(caption));
            blocks
        }
    }
}

fn embed(el: ElementRef<'_>, ctx: &mut ConversionContext<'_>) -> Vec<Block> {
    let src = el
        .attr("src")
        .or_else(|| el.attr("data"))
        .or_else(|| {
            child_elements(*el, &["source"])
                .next()
                .and_then(|s| s.value().attr("src"))
        })
        .unwrap_or_default();

    match resolve_source(src, ctx) {
        Some(url) => vec![Block::embed(url)],
        None => {
            ctx.warn(ConversionWarning::DroppedBlock {
                kind: "embed",
                reason: format!("unusable source {src:?}"),
            });
            Vec::new()
        }
    }
}

fn toggle(el: ElementRef<'_>, ctx: &mut ConversionContext<'_>, level: usize) -> Vec<Block> {
    let summary = child_elements(*el, &["summary"])
        .next()
        .map(|s| compile_element(s, &ctx.inline(InlineMode::Collapse)).rich_text)
        .unwrap_or_default();

    let body = el
        .children()
        .filter(|c| !matches!(c.value(), Node::Element(e) if e.name() == "summary"));
    let (summary, continued) = split_at_run_limit(summary);
    let mut children = paragraphs(continued);
    children.extend(convert_nodes(body, ctx, level + 1));

    let mut toggle = Block::toggle(summary);
    let overflow = attach_children(&mut toggle, children, level);
    let mut out = vec![toggle];
    out.extend(overflow);
    out
}

fn definition_list(el: ElementRef<'_>, ctx: &mut ConversionContext<'_>, level: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    for item in child_elements(*el, &["dt", "dd", "div"]) {
        match item.value().name() {
            "dt" => {
                let mut term = compile_element(item, &ctx.inline(InlineMode::Collapse)).rich_text;
                for run in &mut term {
                    run.annotations.bold = true;
                }
                blocks.extend(paragraphs(term));
            }
            "dd" => blocks.extend(convert_nodes(item.children(), ctx, level)),
            _ => blocks.extend(definition_list(item, ctx, level)),
        }
    }
    blocks
}

/// Absolute http(s) URL for `src`, resolving relative sources against the
/// configured base URL
fn resolve_source(src: &str, ctx: &ConversionContext<'_>) -> Option<String> {
    let src = src.trim();
    if is_valid_url(src) {
        return Some(src.to_string());
    }
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    let base = url::Url::parse(ctx.options.base_url.as_deref()?).ok()?;
    let joined = base.join(src).ok()?.to_string();
    is_valid_url(&joined).then_some(joined)
}

/// Image block awaiting upload, or `None` (with a warning) when the source
/// cannot be used
pub(crate) fn image_block(
    src: &str,
    alt: &str,
    caption: RichText,
    ctx: &mut ConversionContext<'_>,
) -> Option<Block> {
    if !ctx.options.preserve_images {
        return None;
    }

    let Some(url) = resolve_source(src, ctx) else {
        let reason = if src.trim().starts_with("data:") {
            "inline data URI"
        } else if src.trim().is_empty() {
            "missing source"
        } else {
            "not an absolute http(s) URL"
        };
        ctx.warn(ConversionWarning::DroppedImage {
            src: crate::utils::safe_truncate_chars(src, 120).to_string(),
            reason: reason.to_string(),
        });
        return None;
    };

    Some(Block::image(Image {
        source: ImageSource::Pending { url },
        alt: alt.trim().to_string(),
        caption,
    }))
}

/// Image blocks for media collected from inline content
pub(crate) fn image_blocks(media: Vec<MediaRef>, ctx: &mut ConversionContext<'_>) -> Vec<Block> {
    media
        .into_iter()
        .filter_map(|m| image_block(&m.src, &m.alt, Vec::new(), ctx))
        .collect()
}
