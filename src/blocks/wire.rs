//! Host wire format for blocks and rich text
//!
//! ```text
//! Block       = { object: "block", type: <kind>, <kind>: <payload>, children?: Block[] }
//! RichTextRun = { type: "text", text: { content, link?: { url } }, annotations: {...} }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::annotations::Annotations;
use super::rich_text::{RichText, TextRun};
use super::{Block, BlockContent, ImageSource, Table};

/// Serialise runs into the host's rich-text array
pub fn rich_text_to_wire(runs: &[TextRun]) -> Value {
    Value::Array(runs.iter().map(run_to_wire).collect())
}

fn run_to_wire(run: &TextRun) -> Value {
    let mut text = Map::new();
    text.insert("content".into(), Value::String(run.content.clone()));
    if let Some(url) = &run.link {
        text.insert("link".into(), json!({ "url": url }));
    }

    json!({
        "type": "text",
        "text": Value::Object(text),
        "annotations": run.annotations,
    })
}

fn table_to_wire(table: &Table) -> Value {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<Value> = row.cells.iter().map(|c| rich_text_to_wire(c)).collect();
            json!({ "type": "table_row", "table_row": { "cells": cells } })
        })
        .collect();

    json!({
        "table_width": table.width,
        "has_column_header": table.has_column_header,
        "has_row_header": false,
        "children": rows,
    })
}

impl Block {
    /// Payload object stored under the block's kind key
    #[must_use]
    pub fn payload_to_wire(&self) -> Value {
        match &self.content {
            BlockContent::Paragraph { rich_text }
            | BlockContent::Heading { rich_text, .. }
            | BlockContent::BulletedListItem { rich_text }
            | BlockContent::NumberedListItem { rich_text }
            | BlockContent::Quote { rich_text }
            | BlockContent::Toggle { rich_text } => json!({
                "rich_text": rich_text_to_wire(rich_text),
                "color": "default",
            }),
            BlockContent::Code { rich_text, language } => json!({
                "rich_text": rich_text_to_wire(rich_text),
                "language": language,
            }),
            BlockContent::Callout { rich_text, icon, color } => json!({
                "rich_text": rich_text_to_wire(rich_text),
                "icon": { "type": "emoji", "emoji": icon },
                "color": color,
            }),
            BlockContent::Image(image) => {
                let caption = rich_text_to_wire(&image.caption);
                match &image.source {
                    ImageSource::FileUpload { id } => json!({
                        "type": "file_upload",
                        "file_upload": { "id": id },
                        "caption": caption,
                    }),
                    ImageSource::External { url } | ImageSource::Pending { url } => json!({
                        "type": "external",
                        "external": { "url": url },
                        "caption": caption,
                    }),
                }
            }
            BlockContent::Embed { url } => json!({ "url": url }),
            BlockContent::Divider => json!({}),
            BlockContent::Table(table) => table_to_wire(table),
        }
    }

    /// Full wire object, children included
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let kind = self.kind();
        let mut obj = Map::new();
        obj.insert("object".into(), Value::String("block".into()));
        obj.insert("type".into(), Value::String(kind.into()));
        obj.insert(kind.into(), self.payload_to_wire());
        if !self.children.is_empty() {
            obj.insert(
                "children".into(),
                Value::Array(self.children.iter().map(Block::to_wire).collect()),
            );
        }
        Value::Object(obj)
    }
}

/// Serialise a block slice as a `children` array
pub fn blocks_to_wire(blocks: &[Block]) -> Value {
    Value::Array(blocks.iter().map(Block::to_wire).collect())
}

#[derive(Debug, Deserialize)]
struct WireRun {
    #[serde(default)]
    text: Option<WireText>,
    #[serde(default)]
    annotations: Annotations,
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: Option<WireLink>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    url: String,
}

/// Parse a host rich-text array. Non-text runs (mentions, equations) are
/// read through their `plain_text`.
pub fn rich_text_from_wire(value: &Value) -> RichText {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<WireRun>(item.clone()).ok())
        .map(|run| match run.text {
            Some(text) => TextRun {
                content: text.content,
                annotations: run.annotations,
                link: text.link.map(|l| l.url),
            },
            None => TextRun {
                content: run.plain_text.unwrap_or_default(),
                annotations: run.annotations,
                link: run.href,
            },
        })
        .collect()
}

/// A block as reported by the host's children listing
#[derive(Debug, Clone, PartialEq)]
pub struct HostBlock {
    pub id: String,
    pub kind: String,
    pub has_children: bool,
    /// Primary rich-text field (`caption` for images), when the kind has one
    pub rich_text: Option<RichText>,
}

#[derive(Debug, Deserialize)]
struct RawHostBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl HostBlock {
    /// Decode one entry of a `results` array
    pub fn from_wire(value: &Value) -> Result<Self, serde_json::Error> {
        let raw: RawHostBlock = serde_json::from_value(value.clone())?;
        let rich_text = raw
            .rest
            .get(&raw.kind)
            .and_then(|payload| payload.get("rich_text").or_else(|| payload.get("caption")))
            .map(rich_text_from_wire);

        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            has_children: raw.has_children,
            rich_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{HeadingLevel, TableRow};

    #[test]
    fn paragraph_wire_shape() {
        let block = Block::paragraph(vec![
            TextRun::styled("Hello", Annotations::bold()),
            TextRun::plain("docs").with_link("https://docs.example.com/a"),
        ]);

        let wire = block.to_wire();

        assert_eq!(wire["object"], "block");
        assert_eq!(wire["type"], "paragraph");
        assert_eq!(wire["paragraph"]["rich_text"][0]["type"], "text");
        assert_eq!(wire["paragraph"]["rich_text"][0]["annotations"]["bold"], true);
        assert_eq!(
            wire["paragraph"]["rich_text"][1]["text"]["link"]["url"],
            "https://docs.example.com/a"
        );
        assert!(wire["paragraph"]["rich_text"][0]["text"].get("link").is_none());
        assert!(wire.get("children").is_none());
    }

    #[test]
    fn table_rows_live_inside_payload() {
        let block = Block::table(Table {
            width: 2,
            has_column_header: true,
            rows: vec![TableRow {
                cells: vec![vec![TextRun::plain("a")], vec![]],
            }],
        });

        let wire = block.to_wire();

        assert_eq!(wire["table"]["table_width"], 2);
        assert_eq!(wire["table"]["has_row_header"], false);
        assert_eq!(wire["table"]["children"][0]["type"], "table_row");
        assert_eq!(
            wire["table"]["children"][0]["table_row"]["cells"].as_array().unwrap().len(),
            2
        );
    }

    #[test]
    fn nested_children_serialize() {
        let block = Block::bulleted(vec![TextRun::plain("outer")])
            .with_children(vec![Block::heading(HeadingLevel::H2, vec![TextRun::plain("x")])]);
        let wire = block.to_wire();
        assert_eq!(wire["children"][0]["type"], "heading_2");
    }

    #[test]
    fn host_block_reads_rich_text() {
        let value = serde_json::json!({
            "object": "block",
            "id": "b1",
            "type": "bulleted_list_item",
            "has_children": true,
            "bulleted_list_item": {
                "rich_text": [
                    { "type": "text", "text": { "content": "Item", "link": null },
                      "annotations": { "bold": true, "italic": false, "strikethrough": false,
                                       "underline": false, "code": false, "color": "default" },
                      "plain_text": "Item", "href": null }
                ],
                "color": "default"
            }
        });

        let block = HostBlock::from_wire(&value).unwrap();

        assert_eq!(block.id, "b1");
        assert!(block.has_children);
        assert_eq!(
            block.rich_text.unwrap(),
            vec![TextRun::styled("Item", Annotations::bold())]
        );
    }
}
