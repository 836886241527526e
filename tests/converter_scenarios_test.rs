mod common;

use common::text_of;
use sn2n::blocks::{BlockContent, max_nesting_depth};
use sn2n::{ConversionOptions, ConversionWarning, convert_html_to_blocks};

#[test]
fn bold_and_italic_runs_keep_the_separating_space() {
    let conversion = convert_html_to_blocks("<p><b>Hello</b> <i>World</i></p>", &ConversionOptions::default());

    let rich_text = conversion.blocks[0].rich_text().unwrap();
    assert_eq!(rich_text.len(), 2);
    assert_eq!(rich_text[0].content, "Hello ");
    assert!(rich_text[0].annotations.bold);
    assert_eq!(rich_text[1].content, "World");
    assert!(rich_text[1].annotations.italic);
    assert!(!rich_text[1].annotations.bold);
}

#[test]
fn three_level_list_tags_the_deepest_level_for_relocation() {
    let html = r#"
        <ul>
          <li>Outer
            <ul>
              <li>Middle
                <ul><li>Deep</li></ul>
              </li>
            </ul>
          </li>
        </ul>"#;

    let conversion = convert_html_to_blocks(html, &ConversionOptions::default());

    assert_eq!(conversion.blocks.len(), 1);
    let outer = &conversion.blocks[0];
    assert_eq!(text_of(outer), "Outer");

    let middle = &outer.children[0];
    assert_eq!(text_of(middle), "Middle");
    assert_eq!(middle.owns.len(), 1);
    assert!(middle.children.is_empty());

    let deep = &outer.children[1];
    assert_eq!(text_of(deep), "Deep");
    assert_eq!(deep.relocate_to.as_ref(), Some(&middle.owns[0]));
    assert!(max_nesting_depth(&conversion.blocks) <= 2);
}

#[test]
fn table_with_thead_gets_a_column_header() {
    let html = r#"
        <table>
          <thead><tr><th>Name</th><th>Type</th></tr></thead>
          <tbody>
            <tr><td>sys_id</td><td>GUID</td></tr>
            <tr><td>number</td></tr>
          </tbody>
        </table>"#;

    let conversion = convert_html_to_blocks(html, &ConversionOptions::default());

    let BlockContent::Table(table) = &conversion.blocks[0].content else {
        panic!("expected a table, got {}", conversion.blocks[0].kind());
    };
    assert_eq!(table.width, 2);
    assert!(table.has_column_header);
    assert_eq!(table.rows.len(), 3);
    assert!(table.rows.iter().all(|r| r.cells.len() == 2));
    assert!(table.rows[2].cells[1].is_empty());
}

#[test]
fn identifiers_become_inline_code() {
    let conversion = convert_html_to_blocks(
        "<p>Use field sys_id.value here, not some.regular.words</p>",
        &ConversionOptions::default(),
    );

    let runs = conversion.blocks[0].rich_text().unwrap();
    let code: Vec<&str> = runs
        .iter()
        .filter(|r| r.annotations.code)
        .map(|r| r.content.as_str())
        .collect();
    assert_eq!(code, vec!["sys_id.value"]);
}

#[test]
fn identifier_detection_can_be_disabled() {
    let mut options = ConversionOptions::default();
    options.identifier_policy.enabled = false;

    let conversion = convert_html_to_blocks("<p>Use field sys_id.value here</p>", &options);

    let runs = conversion.blocks[0].rich_text().unwrap();
    assert!(runs.iter().all(|r| !r.annotations.code));
}

#[test]
fn document_outline_converts_in_order() {
    let html = r#"
        <h1>Install</h1>
        <p>Before you begin:</p>
        <div class="note">Back up your <span class="uicontrol">Settings</span>.</div>
        <pre class="language-js">var gr = new GlideRecord('incident');</pre>
        <ol><li>Open the console</li><li>Run it</li></ol>
        <hr>
        <img src="https://docs.example.com/shot.png" alt="Console">"#;

    let conversion = convert_html_to_blocks(html, &ConversionOptions::default());

    let kinds: Vec<&str> = conversion.blocks.iter().map(|b| b.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "heading_1",
            "paragraph",
            "callout",
            "code",
            "numbered_list_item",
            "numbered_list_item",
            "divider",
            "image"
        ]
    );

    let BlockContent::Code { language, .. } = &conversion.blocks[3].content else {
        panic!("expected code");
    };
    assert_eq!(language, "javascript");
    assert!(conversion.warnings.is_empty());
}

#[test]
fn relative_images_without_base_url_are_dropped_with_a_warning() {
    let conversion = convert_html_to_blocks(r#"<img src="/img/a.png" alt="a">"#, &ConversionOptions::default());

    assert!(conversion.blocks.is_empty());
    assert!(matches!(
        conversion.warnings.as_slice(),
        [ConversionWarning::DroppedImage { .. }]
    ));
}

#[test]
fn relative_images_resolve_against_base_url() {
    let options = ConversionOptions::default().with_base_url("https://docs.example.com/guide/");
    let conversion = convert_html_to_blocks(r#"<img src="img/a.png" alt="a">"#, &options);

    assert_eq!(conversion.blocks.len(), 1);
    assert_eq!(conversion.blocks[0].kind(), "image");
}
