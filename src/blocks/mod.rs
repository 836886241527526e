//! Typed block tree produced by conversion and consumed by the committer
//!
//! Each block kind owns its own payload ([`BlockContent`]); consumers match
//! on it exhaustively instead of looking payloads up by kind name. Only list
//! items and toggles carry `children`.

pub mod annotations;
pub mod relocation;
pub mod rich_text;
pub mod wire;

pub use annotations::{Annotations, Color, PartialAnnotations};
pub use relocation::{MARKER_PREFIX, RelocationId, contains_marker, strip_marker_tokens};
pub use rich_text::{RichText, TextRun, plain_text};
pub use wire::{HostBlock, blocks_to_wire, rich_text_from_wire, rich_text_to_wire};

/// Heading levels the host supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map an HTML heading rank; `h4`–`h6` collapse into level 3
    #[must_use]
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }
}

/// Where an image's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Source URL found in the HTML, not yet passed through the image service
    Pending { url: String },
    /// Referenced by URL
    External { url: String },
    /// Uploaded to the host
    FileUpload { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub source: ImageSource,
    pub alt: String,
    pub caption: RichText,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<RichText>,
}

/// Grid block; every row has exactly `width` cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub width: usize,
    pub has_column_header: bool,
    pub rows: Vec<TableRow>,
}

/// Payload of a block, one variant per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    Paragraph { rich_text: RichText },
    Heading { level: HeadingLevel, rich_text: RichText },
    BulletedListItem { rich_text: RichText },
    NumberedListItem { rich_text: RichText },
    Table(Table),
    Code { rich_text: RichText, language: String },
    Quote { rich_text: RichText },
    Callout { rich_text: RichText, icon: String, color: Color },
    Image(Image),
    Embed { url: String },
    Divider,
    Toggle { rich_text: RichText },
}

/// One node of the output document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub content: BlockContent,
    pub children: Vec<Block>,
    /// Set on overflow content that must end up under the owner of this id
    pub relocate_to: Option<RelocationId>,
    /// Relocations this block will receive as children once it exists
    pub owns: Vec<RelocationId>,
}

impl Block {
    pub fn new(content: BlockContent) -> Self {
        Self {
            content,
            children: Vec::new(),
            relocate_to: None,
            owns: Vec::new(),
        }
    }

    pub fn paragraph(rich_text: RichText) -> Self {
        Self::new(BlockContent::Paragraph { rich_text })
    }

    pub fn heading(level: HeadingLevel, rich_text: RichText) -> Self {
        Self::new(BlockContent::Heading { level, rich_text })
    }

    pub fn bulleted(rich_text: RichText) -> Self {
        Self::new(BlockContent::BulletedListItem { rich_text })
    }

    pub fn numbered(rich_text: RichText) -> Self {
        Self::new(BlockContent::NumberedListItem { rich_text })
    }

    pub fn list_item(ordered: bool, rich_text: RichText) -> Self {
        if ordered {
            Self::numbered(rich_text)
        } else {
            Self::bulleted(rich_text)
        }
    }

    pub fn code(rich_text: RichText, language: impl Into<String>) -> Self {
        Self::new(BlockContent::Code {
            rich_text,
            language: language.into(),
        })
    }

    pub fn quote(rich_text: RichText) -> Self {
        Self::new(BlockContent::Quote { rich_text })
    }

    pub fn callout(rich_text: RichText, icon: impl Into<String>, color: Color) -> Self {
        Self::new(BlockContent::Callout {
            rich_text,
            icon: icon.into(),
            color,
        })
    }

    pub fn image(image: Image) -> Self {
        Self::new(BlockContent::Image(image))
    }

    pub fn embed(url: impl Into<String>) -> Self {
        Self::new(BlockContent::Embed { url: url.into() })
    }

    pub fn divider() -> Self {
        Self::new(BlockContent::Divider)
    }

    pub fn toggle(rich_text: RichText) -> Self {
        Self::new(BlockContent::Toggle { rich_text })
    }

    pub fn table(table: Table) -> Self {
        Self::new(BlockContent::Table(table))
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// Host type name, e.g. `bulleted_list_item` or `heading_2`
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match &self.content {
            BlockContent::Paragraph { .. } => "paragraph",
            BlockContent::Heading { level, .. } => match level {
                HeadingLevel::H1 => "heading_1",
                HeadingLevel::H2 => "heading_2",
                HeadingLevel::H3 => "heading_3",
            },
            BlockContent::BulletedListItem { .. } => "bulleted_list_item",
            BlockContent::NumberedListItem { .. } => "numbered_list_item",
            BlockContent::Table(_) => "table",
            BlockContent::Code { .. } => "code",
            BlockContent::Quote { .. } => "quote",
            BlockContent::Callout { .. } => "callout",
            BlockContent::Image(_) => "image",
            BlockContent::Embed { .. } => "embed",
            BlockContent::Divider => "divider",
            BlockContent::Toggle { .. } => "toggle",
        }
    }

    /// The block's primary rich-text field, if its kind has one
    #[must_use]
    pub fn rich_text(&self) -> Option<&RichText> {
        match &self.content {
            BlockContent::Paragraph { rich_text }
            | BlockContent::Heading { rich_text, .. }
            | BlockContent::BulletedListItem { rich_text }
            | BlockContent::NumberedListItem { rich_text }
            | BlockContent::Code { rich_text, .. }
            | BlockContent::Quote { rich_text }
            | BlockContent::Callout { rich_text, .. }
            | BlockContent::Toggle { rich_text } => Some(rich_text),
            BlockContent::Image(image) => Some(&image.caption),
            BlockContent::Table(_) | BlockContent::Embed { .. } | BlockContent::Divider => None,
        }
    }

    pub fn rich_text_mut(&mut self) -> Option<&mut RichText> {
        match &mut self.content {
            BlockContent::Paragraph { rich_text }
            | BlockContent::Heading { rich_text, .. }
            | BlockContent::BulletedListItem { rich_text }
            | BlockContent::NumberedListItem { rich_text }
            | BlockContent::Code { rich_text, .. }
            | BlockContent::Quote { rich_text }
            | BlockContent::Callout { rich_text, .. }
            | BlockContent::Toggle { rich_text } => Some(rich_text),
            BlockContent::Image(image) => Some(&mut image.caption),
            BlockContent::Table(_) | BlockContent::Embed { .. } | BlockContent::Divider => None,
        }
    }

    /// Whether the kind may own `children`
    #[must_use]
    pub fn accepts_children(&self) -> bool {
        matches!(
            self.content,
            BlockContent::BulletedListItem { .. }
                | BlockContent::NumberedListItem { .. }
                | BlockContent::Toggle { .. }
        )
    }

    /// Levels of nesting this block occupies below itself
    ///
    /// Table rows are written as children of the table, so a table always
    /// needs one level.
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        let own = match &self.content {
            BlockContent::Table(table) if !table.rows.is_empty() => 1,
            _ => 0,
        };
        let below = self
            .children
            .iter()
            .map(|c| 1 + c.nesting_depth())
            .max()
            .unwrap_or(0);
        own.max(below)
    }

    /// Visit this block and all descendants, depth-first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Deepest nesting among `blocks` (0 when none has children)
pub fn max_nesting_depth(blocks: &[Block]) -> usize {
    blocks.iter().map(Block::nesting_depth).max().unwrap_or(0)
}

/// Total block count including descendants (table rows excluded)
pub fn count_blocks(blocks: &[Block]) -> usize {
    blocks.iter().map(|b| 1 + count_blocks(&b.children)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> Block {
        Block::bulleted(vec![TextRun::plain(text)])
    }

    #[test]
    fn nesting_depth_counts_table_rows() {
        let table = Block::table(Table {
            width: 1,
            has_column_header: false,
            rows: vec![TableRow {
                cells: vec![vec![TextRun::plain("a")]],
            }],
        });
        let outer = item("outer").with_children(vec![table]);

        assert_eq!(outer.nesting_depth(), 2);
    }

    #[test]
    fn heading_kind_names() {
        assert_eq!(Block::heading(HeadingLevel::from_rank(5), vec![]).kind(), "heading_3");
        assert_eq!(Block::heading(HeadingLevel::from_rank(2), vec![]).kind(), "heading_2");
    }

    #[test]
    fn counts_nested_blocks() {
        let tree = vec![item("a").with_children(vec![item("b").with_children(vec![item("c")])]), item("d")];
        assert_eq!(count_blocks(&tree), 4);
        assert_eq!(max_nesting_depth(&tree), 2);
    }
}
