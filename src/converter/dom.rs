//! DOM helpers over `scraper`'s ego-tree nodes

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded selector 'body' is statically valid")
});

/// Elements that start a new block when met in block context
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "center", "details", "dialog", "div",
    "dl", "embed", "fieldset", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "iframe", "img", "main", "object", "ol", "p", "pre", "section", "table",
    "ul", "video",
];

/// Elements whose content is never rendered
const SKIPPED_TAGS: &[&str] = &[
    "button", "head", "link", "meta", "nav", "noscript", "script", "style", "svg", "template",
    "title",
];

pub(crate) fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

pub(crate) fn is_skipped_tag(name: &str) -> bool {
    SKIPPED_TAGS.contains(&name)
}

/// Tag name of an element node
pub(crate) fn tag_name<'a>(node: &NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Element(el) => Some(el.name()),
        _ => None,
    }
}

/// True for element nodes that are block-level in block context
pub(crate) fn is_block_node(node: &NodeRef<'_, Node>) -> bool {
    tag_name(node).is_some_and(is_block_tag)
}

/// Whether any descendant is a block-level element
pub(crate) fn has_block_descendant(node: &NodeRef<'_, Node>) -> bool {
    node.descendants()
        .skip(1)
        .any(|d| tag_name(&d).is_some_and(|t| is_block_tag(t) && t != "img"))
}

/// Whether any descendant has one of the given tag names
pub(crate) fn has_descendant_tag(node: &NodeRef<'_, Node>, tags: &[&str]) -> bool {
    node.descendants()
        .skip(1)
        .any(|d| tag_name(&d).is_some_and(|t| tags.contains(&t)))
}

/// Direct element children with the given tag names
pub(crate) fn child_elements<'a>(
    node: NodeRef<'a, Node>,
    tags: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    node.children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| tags.contains(&el.value().name()))
}

/// True when the node is whitespace-only text or a comment
pub(crate) fn is_ignorable(node: &NodeRef<'_, Node>) -> bool {
    match node.value() {
        Node::Text(text) => text.trim().is_empty(),
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => true,
        _ => false,
    }
}

/// Plain text of a node, with `<br>` as newline
pub(crate) fn raw_text(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for d in node.descendants() {
        match d.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Parse a document or fragment and hand back its body element
///
/// html5ever places fragments inside a synthetic body, so full pages and
/// snippets take the same path.
pub(crate) fn parse_body(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&BODY_SELECTOR).next()
}
