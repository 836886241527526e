//! `<table>` → table block
//!
//! Rows come from `thead` first, then `tbody`, `tfoot` and bare `tr`
//! children in document order (html5ever wraps bare rows in a `tbody`).
//! `colspan` is expanded into empty cells and short rows are padded, so every
//! row ends up exactly `width` cells wide.

use scraper::ElementRef;

use super::dom::{child_elements, has_descendant_tag};
use super::inline::{InlineMode, MediaRef, compile_element};
use super::{ConversionContext, ConversionWarning};
use crate::blocks::rich_text::fold_to_run_limit;
use crate::blocks::{Block, RichText, Table, TableRow};
use crate::utils::MAX_TABLE_ROWS;

/// Upper bound on a single cell's `colspan`
const MAX_COLSPAN: usize = 50;

/// Blocks produced for one `<table>`
#[derive(Debug, Default)]
pub struct TableOutput {
    /// `<caption>` text, placed before the table
    pub caption: RichText,
    /// Images inside the caption, placed between caption and table
    pub caption_media: Vec<MediaRef>,
    /// One or more table blocks
    pub blocks: Vec<Block>,
    /// Images found inside cells, to be emitted after the table
    pub media: Vec<MediaRef>,
}

struct GridRow {
    cells: Vec<RichText>,
    has_image: bool,
}

/// Build the table block(s) for `table`
pub fn build_table(table: ElementRef<'_>, ctx: &mut ConversionContext<'_>) -> TableOutput {
    let mut out = TableOutput::default();

    if let Some(caption) = child_elements(*table, &["caption"]).next() {
        let caption = compile_element(caption, &ctx.inline(InlineMode::Collapse));
        out.caption = caption.rich_text;
        out.caption_media = caption.media;
    }

    let has_thead = child_elements(*table, &["thead"]).next().is_some();
    let mut rows: Vec<GridRow> = Vec::new();

    for section in child_elements(*table, &["thead"]) {
        for tr in child_elements(*section, &["tr"]) {
            rows.push(build_row(tr, ctx, &mut out.media));
        }
    }
    for child in child_elements(*table, &["tbody", "tfoot", "tr"]) {
        if child.value().name() == "tr" {
            rows.push(build_row(child, ctx, &mut out.media));
        } else {
            for tr in child_elements(*child, &["tr"]) {
                rows.push(build_row(tr, ctx, &mut out.media));
            }
        }
    }

    let width = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    if rows.is_empty() || width == 0 {
        ctx.warn(ConversionWarning::DroppedBlock {
            kind: "table",
            reason: "table has no rows".to_string(),
        });
        return out;
    }

    let has_column_header = has_thead && !rows[0].has_image;
    let mut rows: Vec<TableRow> = rows
        .into_iter()
        .map(|mut row| {
            row.cells.resize_with(width, Vec::new);
            TableRow { cells: row.cells }
        })
        .collect();

    if rows.len() <= MAX_TABLE_ROWS {
        out.blocks.push(Block::table(Table {
            width,
            has_column_header,
            rows,
        }));
        return out;
    }

    let total = rows.len();
    let header = if has_column_header {
        Some(rows.remove(0))
    } else {
        None
    };
    let per_part = MAX_TABLE_ROWS - usize::from(header.is_some());
    let parts: Vec<Vec<TableRow>> = rows.chunks(per_part).map(<[TableRow]>::to_vec).collect();

    ctx.warn(ConversionWarning::SplitTable {
        rows: total,
        parts: parts.len(),
    });

    for part in parts {
        let mut part_rows = Vec::with_capacity(part.len() + 1);
        part_rows.extend(header.iter().cloned());
        part_rows.extend(part);
        out.blocks.push(Block::table(Table {
            width,
            has_column_header,
            rows: part_rows,
        }));
    }

    out
}

fn build_row(tr: ElementRef<'_>, ctx: &mut ConversionContext<'_>, media: &mut Vec<MediaRef>) -> GridRow {
    let mut row = GridRow {
        cells: Vec::new(),
        has_image: false,
    };

    for cell in child_elements(*tr, &["td", "th"]) {
        let multiline = has_descendant_tag(&cell, &["ul", "ol", "br"])
            || child_elements(*cell, &["p"]).count() > 1;
        let mode = if multiline {
            InlineMode::Newlines
        } else {
            InlineMode::Collapse
        };

        let mut options = ctx.inline(mode);
        options.media_alt_text = true;
        let compiled = compile_element(cell, &options);

        row.has_image |= !compiled.media.is_empty();
        media.extend(compiled.media);

        let (cell_text, dropped) = fold_to_run_limit(compiled.rich_text);
        if dropped > 0 {
            ctx.warn(ConversionWarning::TruncatedText {
                kind: "table_cell",
                chars: dropped,
            });
        }
        row.cells.push(cell_text);

        let span = cell
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        for _ in 1..span {
            row.cells.push(Vec::new());
        }
    }

    row
}
