//! HTML → block conversion
//!
//! Conversion is a pure, synchronous transform over one document:
//! 1. Protect angle-bracket placeholders (`<instance-name>`) from the parser
//! 2. Parse once with html5ever (via `scraper`)
//! 3. Walk the body, dispatching block elements to the segmenter, lists to
//!    the list normaliser and tables to the table builder
//! 4. Compile inline content into annotated text runs
//!
//! Malformed markup never fails conversion; content that cannot be expressed
//! as a block is dropped and reported in [`Conversion::warnings`].
//!
//! # Usage
//!
//! ```rust
//! # use sn2n::converter::{convert_html_to_blocks, ConversionOptions};
//! let html = "<h2>Setup</h2><p>Open <b>System Settings</b>.</p>";
//! let conversion = convert_html_to_blocks(html, &ConversionOptions::default());
//! assert_eq!(conversion.blocks.len(), 2);
//! assert_eq!(conversion.blocks[0].kind(), "heading_2");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blocks::{Block, RelocationId};
use crate::utils::{DEFAULT_MAX_LIST_DEPTH, MAX_BLOCK_NESTING, MAX_CHILDREN_PER_CALL};

pub mod callout;
pub mod code_language;
pub(crate) mod dom;
pub mod inline;
pub mod list;
pub mod media;
pub mod placeholders;
pub mod segmenter;
pub mod table;

pub use callout::CalloutStyle;
pub use inline::{InlineMode, InlineOptions, InlineOutput, MediaRef, compile_inline};
pub use inline::identifiers::IdentifierPolicy;
pub use media::resolve_media;
pub use segmenter::convert_html_to_blocks;

/// Configuration options for HTML to block conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Base URL for resolving relative links and image sources (default: None)
    ///
    /// Without it, relative links are demoted to plain text and relative
    /// images are dropped.
    pub base_url: Option<String>,

    /// Heuristic for wrapping technical identifiers as inline code
    pub identifier_policy: IdentifierPolicy,

    /// List depth converted in place (default: 2); deeper lists are relocated
    pub max_list_depth: usize,

    /// Emit image blocks (default: true)
    pub preserve_images: bool,

    /// Class names recognised as callouts, with their icon and colour
    pub callout_styles: Vec<CalloutStyle>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            identifier_policy: IdentifierPolicy::default(),
            max_list_depth: DEFAULT_MAX_LIST_DEPTH,
            preserve_images: true,
            callout_styles: CalloutStyle::defaults(),
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub(crate) fn inline(&self, mode: InlineMode) -> InlineOptions<'_> {
        InlineOptions {
            base_url: self.base_url.as_deref(),
            policy: &self.identifier_policy,
            mode,
            media_alt_text: false,
        }
    }
}

/// Content dropped or altered during conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionWarning {
    /// A block had no usable payload for its kind
    DroppedBlock { kind: &'static str, reason: String },
    /// An image could not be resolved to a host-usable source
    DroppedImage { src: String, reason: String },
    /// A table was split to respect the per-call row limit
    SplitTable { rows: usize, parts: usize },
    /// Text past what one rich-text field can hold was dropped
    TruncatedText { kind: &'static str, chars: usize },
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionWarning::DroppedBlock { kind, reason } => {
                write!(f, "dropped {kind} block: {reason}")
            }
            ConversionWarning::DroppedImage { src, reason } => {
                write!(f, "dropped image {src}: {reason}")
            }
            ConversionWarning::SplitTable { rows, parts } => {
                write!(f, "split table of {rows} rows into {parts} tables")
            }
            ConversionWarning::TruncatedText { kind, chars } => {
                write!(f, "dropped {chars} characters from {kind} text")
            }
        }
    }
}

/// Result of converting one document
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub blocks: Vec<Block>,
    pub warnings: Vec<ConversionWarning>,
}

/// Per-document state threaded through the converters
pub struct ConversionContext<'o> {
    pub(crate) options: &'o ConversionOptions,
    pub(crate) warnings: Vec<ConversionWarning>,
}

impl<'o> ConversionContext<'o> {
    pub fn new(options: &'o ConversionOptions) -> Self {
        Self {
            options,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, warning: ConversionWarning) {
        tracing::warn!(warning = %warning, "conversion warning");
        self.warnings.push(warning);
    }

    pub(crate) fn inline(&self, mode: InlineMode) -> InlineOptions<'o> {
        self.options.inline(mode)
    }
}

/// Attach `children` to `owner`, which sits at nesting `level`.
///
/// Children that would push the tree past the host's nesting ceiling, or
/// past the children one call can carry, are tagged for relocation under
/// `owner` and returned, to be placed at the owner's sibling level. Blocks
/// already tagged for `owner` go the same way.
/// Once one child is relocated, the following ones are relocated too so their
/// order survives. Blocks tagged for a deeper owner stay beside that owner.
pub(crate) fn attach_children(owner: &mut Block, children: Vec<Block>, level: usize) -> Vec<Block> {
    let mut overflow = Vec::new();

    for mut child in children {
        let full = owner.children.len() >= MAX_CHILDREN_PER_CALL;
        if let Some(target) = &child.relocate_to {
            if overflow.is_empty() && !full && !owner.owns.contains(target) {
                owner.children.push(child);
            } else {
                overflow.push(child);
            }
            continue;
        }

        let fits = !full && level + 1 + child.nesting_depth() <= MAX_BLOCK_NESTING;
        if fits && overflow.is_empty() {
            owner.children.push(child);
        } else {
            child.relocate_to = Some(owner_relocation(owner));
            overflow.push(child);
        }
    }

    overflow
}

/// The relocation id owned by `owner`, minted on first use
pub(crate) fn owner_relocation(owner: &mut Block) -> RelocationId {
    if let Some(id) = owner.owns.first() {
        return id.clone();
    }
    let id = RelocationId::generate();
    tracing::debug!(relocation = %id, kind = owner.kind(), "content exceeds nesting depth, relocating");
    owner.owns.push(id.clone());
    id
}
