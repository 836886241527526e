use proptest::prelude::*;
use sn2n::blocks::{Block, BlockContent, max_nesting_depth};
use sn2n::commit::collect_relocations;
use sn2n::utils::{MAX_CHILDREN_PER_CALL, MAX_RICH_TEXT_RUNS, MAX_TEXT_CONTENT_CHARS};
use sn2n::{ConversionOptions, convert_html_to_blocks};

fn fragment() -> impl Strategy<Value = String> {
    let word = "[a-z_.0-9]{1,12}";
    prop_oneof![
        word.prop_map(|w| format!("{w} ")),
        word.prop_map(|w| format!("<b>{w}</b> ")),
        word.prop_map(|w| format!("<i><code>{w}</code></i>")),
        word.prop_map(|w| format!("<a href=\"https://example.com/{w}\">{w}</a>")),
        (1usize..3000).prop_map(|n| "x".repeat(n)),
        Just("<br>".to_string()),
    ]
}

fn list(depth: usize) -> BoxedStrategy<String> {
    let text = prop::collection::vec(fragment(), 1..4).prop_map(|f| f.concat());
    if depth == 0 {
        return text.prop_map(|t| format!("<li>{t}</li>")).boxed();
    }
    (text, prop::collection::vec(list(depth - 1), 0..3))
        .prop_map(|(t, nested)| format!("<li>{t}<ul>{}</ul></li>", nested.concat()))
        .boxed()
}

/// Alternating bold and italic words, so no two runs merge
fn styled_text() -> impl Strategy<Value = String> {
    (90usize..140).prop_map(|n| {
        (0..n)
            .map(|i| if i % 2 == 0 { format!("<b>w{i}</b>") } else { format!("<i>w{i}</i>") })
            .collect()
    })
}

/// An item whose nested list is wider than one call, or whose own text
/// needs more runs than one field holds
fn oversized_item() -> BoxedStrategy<String> {
    prop_oneof![
        (90usize..160).prop_map(|n| {
            let subs: String = (0..n).map(|i| format!("<li>sub {i}</li>")).collect();
            format!("<li>Parent<ul>{subs}</ul></li>")
        }),
        styled_text().prop_map(|t| format!("<li>{t}<ul><li>child</li></ul></li>")),
        styled_text().prop_map(|t| format!("<li>Outer<ul><li>{t}<ul><li>deep</li></ul></li></ul></li>")),
    ]
    .boxed()
}

fn assert_within_limits(block: &Block) {
    assert!(block.children.len() <= MAX_CHILDREN_PER_CALL);
    if let Some(rich_text) = block.rich_text() {
        assert!(rich_text.len() <= MAX_RICH_TEXT_RUNS);
        for run in rich_text {
            assert!(run.content.chars().count() <= MAX_TEXT_CONTENT_CHARS);
        }
    }
    if let BlockContent::Table(table) = &block.content {
        assert!(table.rows.len() <= MAX_CHILDREN_PER_CALL);
        assert!(table.rows.iter().all(|r| r.cells.len() == table.width));
        for cell in table.rows.iter().flat_map(|r| &r.cells) {
            assert!(cell.len() <= MAX_RICH_TEXT_RUNS);
        }
    }
    for child in &block.children {
        assert_within_limits(child);
    }
}

proptest! {
    #[test]
    fn paragraphs_respect_text_limits(fragments in prop::collection::vec(fragment(), 1..60)) {
        let html = format!("<p>{}</p>", fragments.concat());
        let conversion = convert_html_to_blocks(&html, &ConversionOptions::default());
        for block in &conversion.blocks {
            assert_within_limits(block);
        }
    }

    #[test]
    fn table_cells_respect_run_limits(cells in prop::collection::vec(styled_text(), 1..4)) {
        let row: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        let html = format!("<table><caption>{}</caption><tr>{row}</tr></table>", cells[0]);
        let conversion = convert_html_to_blocks(&html, &ConversionOptions::default());
        for block in &conversion.blocks {
            assert_within_limits(block);
        }
    }

    #[test]
    fn every_write_stays_within_two_levels(
        items in prop::collection::vec(list(4), 1..4),
        oversized in prop::collection::vec(oversized_item(), 0..3),
    ) {
        let html = format!("<ul>{}{}</ul>", items.concat(), oversized.concat());
        let mut blocks = convert_html_to_blocks(&html, &ConversionOptions::default()).blocks;
        let total = sn2n::blocks::count_blocks(&blocks);

        let queue = collect_relocations(&mut blocks);

        prop_assert!(max_nesting_depth(&blocks) <= 2);
        let mut written = sn2n::blocks::count_blocks(&blocks);
        for id in queue.ids() {
            let relocated = queue.blocks(id).unwrap_or_default();
            prop_assert!(max_nesting_depth(relocated) <= 2);
            relocated.iter().for_each(assert_within_limits);
            written += sn2n::blocks::count_blocks(relocated);
        }
        // overflow is moved, never dropped
        prop_assert_eq!(written, total);
        for block in &blocks {
            assert_within_limits(block);
        }
    }
}
