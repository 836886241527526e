//! Typed inline token stream
//!
//! The DOM below a block element is flattened into open/close/text tokens.
//! html5ever has already decoded entities and repaired unterminated tags,
//! so the builder never sees raw markup.

use ego_tree::NodeRef;
use scraper::node::{Element, Node};

use super::MediaRef;
use crate::blocks::Color;
use crate::converter::dom::is_skipped_tag;

/// Style carried by an inline element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineTag {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Code,
    /// Preformatted: whitespace is kept as written
    Pre,
    Color(Color),
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken {
    Open(InlineTag),
    Close(InlineTag),
    Text(String),
    /// `<br>`
    LineBreak,
    /// Edge of a nested block element (`p`, `div`, `li`, …)
    BlockBoundary,
    /// Start of a list item; rendered as a bullet in newline mode
    ListItem,
    Media(MediaRef),
}

/// Classes used by documentation generators for inline semantics
const BOLD_CLASSES: &[&str] = &["uicontrol", "wintitle", "notetitle", "b", "bold"];
const CODE_CLASSES: &[&str] = &[
    "codeph", "filepath", "parmname", "cmdname", "varname", "apiname", "option", "keyword-code",
];
const ITALIC_CLASSES: &[&str] = &["i", "italic", "cite"];

/// Elements that break the inline flow
const BOUNDARY_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "pre",
    "section", "table", "tr", "ul",
];

/// Inline styles an element opens, in opening order
fn classify(el: &Element) -> Vec<InlineTag> {
    let mut tags = Vec::new();

    match el.name() {
        "b" | "strong" => tags.push(InlineTag::Bold),
        "i" | "em" | "cite" | "dfn" => tags.push(InlineTag::Italic),
        "code" | "samp" | "kbd" | "tt" | "var" => tags.push(InlineTag::Code),
        "pre" => tags.extend([InlineTag::Code, InlineTag::Pre]),
        "u" | "ins" => tags.push(InlineTag::Underline),
        "s" | "del" | "strike" => tags.push(InlineTag::Strikethrough),
        "mark" => tags.push(InlineTag::Color(Color::YellowBackground)),
        "a" => {
            if let Some(href) = el.attr("href") {
                tags.push(InlineTag::Link(href.to_string()));
            }
        }
        _ => {}
    }

    for class in el.classes() {
        let class = class.to_ascii_lowercase();
        if BOLD_CLASSES.contains(&class.as_str()) && !tags.contains(&InlineTag::Bold) {
            tags.push(InlineTag::Bold);
        } else if CODE_CLASSES.contains(&class.as_str()) && !tags.contains(&InlineTag::Code) {
            tags.push(InlineTag::Code);
        } else if ITALIC_CLASSES.contains(&class.as_str()) && !tags.contains(&InlineTag::Italic) {
            tags.push(InlineTag::Italic);
        }
    }

    if let Some(color) = el.attr("style").and_then(style_color) {
        tags.push(InlineTag::Color(color));
    }

    tags
}

/// `color: red` inside a style attribute, when it names a host colour
fn style_color(style: &str) -> Option<Color> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        if prop.trim().eq_ignore_ascii_case("color") {
            Color::parse(value)
        } else {
            None
        }
    })
}

fn media_from(el: &Element) -> Option<MediaRef> {
    let src = el.attr("src").or_else(|| el.attr("data-src"))?.trim();
    if src.is_empty() {
        return None;
    }
    Some(MediaRef {
        src: src.to_string(),
        alt: el.attr("alt").unwrap_or_default().trim().to_string(),
    })
}

/// Flatten `nodes` and their descendants into a token stream
pub fn tokenize<'a>(nodes: impl IntoIterator<Item = NodeRef<'a, Node>>) -> Vec<InlineToken> {
    let mut out = Vec::new();
    for node in nodes {
        push_node(node, &mut out);
    }
    out
}

fn push_node(node: NodeRef<'_, Node>, out: &mut Vec<InlineToken>) {
    match node.value() {
        Node::Text(text) => out.push(InlineToken::Text((**text).to_string())),
        Node::Element(el) => {
            let name = el.name();
            if is_skipped_tag(name) {
                return;
            }
            match name {
                "br" => out.push(InlineToken::LineBreak),
                "img" => {
                    if let Some(media) = media_from(el) {
                        out.push(InlineToken::Media(media));
                    }
                }
                "td" | "th" => {
                    out.push(InlineToken::Text(" ".to_string()));
                    push_children(node, el, out);
                }
                _ => {
                    let boundary = BOUNDARY_TAGS.contains(&name);
                    if boundary {
                        out.push(InlineToken::BlockBoundary);
                    }
                    if name == "li" {
                        out.push(InlineToken::ListItem);
                    }
                    push_children(node, el, out);
                    if boundary {
                        out.push(InlineToken::BlockBoundary);
                    }
                }
            }
        }
        _ => {}
    }
}

fn push_children(node: NodeRef<'_, Node>, el: &Element, out: &mut Vec<InlineToken>) {
    let tags = classify(el);
    for tag in &tags {
        out.push(InlineToken::Open(tag.clone()));
    }
    for child in node.children() {
        push_node(child, out);
    }
    for tag in tags.into_iter().rev() {
        out.push(InlineToken::Close(tag));
    }
}
