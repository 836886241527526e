//! Inline rich-text compiler
//!
//! Inline HTML (`<b>`, `<a>`, `<code>`, spans with documentation classes) is
//! compiled into annotated [`TextRun`](crate::blocks::TextRun)s in three steps: the DOM is flattened
//! into [`tokens::InlineToken`]s, a [`builder::AnnotationState`] machine turns
//! tokens into runs, and [`finalize`] repairs, merges and splits the result.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::blocks::RichText;
use crate::converter::dom::parse_body;
use crate::converter::placeholders::protect_placeholders;

pub mod builder;
mod finalize;
pub mod identifiers;
pub mod tokens;

use builder::RunBuilder;
use identifiers::IdentifierPolicy;

/// How whitespace and block edges inside the fragment are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineMode {
    /// Whitespace collapses to single spaces; nested blocks become spaces
    #[default]
    Collapse,
    /// Nested blocks start new lines and list items get a bullet
    Newlines,
}

/// Settings for one compilation
#[derive(Debug, Clone, Copy)]
pub struct InlineOptions<'a> {
    pub base_url: Option<&'a str>,
    pub policy: &'a IdentifierPolicy,
    pub mode: InlineMode,
    /// Write an image's alt text where the image stood
    pub media_alt_text: bool,
}

/// Image referenced from inline content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineOutput {
    pub rich_text: RichText,
    /// Images met along the way, in document order
    pub media: Vec<MediaRef>,
}

/// Compile an HTML fragment
pub fn compile_inline(html: &str, options: &InlineOptions<'_>) -> InlineOutput {
    let protected = protect_placeholders(html);
    let document = Html::parse_document(&protected);
    match parse_body(&document) {
        Some(body) => compile_nodes(body.children(), options),
        None => InlineOutput::default(),
    }
}

/// Compile the content of an element already in a parsed document
pub fn compile_element(element: ElementRef<'_>, options: &InlineOptions<'_>) -> InlineOutput {
    compile_nodes(element.children(), options)
}

/// Compile a sequence of sibling nodes
pub fn compile_nodes<'a>(
    nodes: impl IntoIterator<Item = NodeRef<'a, Node>>,
    options: &InlineOptions<'_>,
) -> InlineOutput {
    let mut builder = RunBuilder::new(options);
    builder.feed(tokens::tokenize(nodes));
    builder.finish()
}
