//! Placeholder protection before DOM parsing
//!
//! Documentation prose is full of angle-bracket placeholders such as
//! `<instance-name>` or `<your table>`. An HTML parser would turn them into
//! unknown elements and swallow the text that follows. Before parsing, every
//! such token that is not a known HTML element (and is never closed) is
//! escaped to `&lt;…&gt;`; the parser then hands it back as literal text.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `<word>` or `<several words>` without attributes, quotes, or slashes
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9_.\-]*(?: [A-Za-z0-9_.\-]+)*)>")
        .expect("BUG: placeholder regex is statically valid")
});

const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "font", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img",
    "input", "ins", "kbd", "label", "legend", "li", "link", "main", "map", "mark", "menu",
    "meta", "meter", "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p",
    "param", "picture", "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script",
    "search", "section", "select", "slot", "small", "source", "span", "strike", "strong",
    "style", "sub", "summary", "sup", "svg", "table", "tbody", "td", "template", "textarea",
    "tfoot", "th", "thead", "time", "title", "tr", "track", "tt", "u", "ul", "var", "video",
    "wbr",
];

fn is_html_element(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    HTML_ELEMENTS.contains(&lower.as_str())
}

/// Escape angle-bracket placeholders so the parser keeps them as text.
///
/// A token is a placeholder when its first word is not an HTML element and
/// the document contains no matching closing tag.
pub fn protect_placeholders(html: &str) -> Cow<'_, str> {
    PLACEHOLDER.replace_all(html, |caps: &Captures| {
        let inner = &caps[1];
        let name = inner.split(' ').next().unwrap_or(inner);
        let closed = html.contains(&format!("</{name}"));

        if is_html_element(name) || closed {
            caps[0].to_string()
        } else {
            format!("&lt;{}&gt;", html_escape::encode_text(inner))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_unknown_tokens() {
        assert_eq!(
            protect_placeholders("Navigate to <instance-name>.service-now.com"),
            "Navigate to &lt;instance-name&gt;.service-now.com"
        );
        assert_eq!(
            protect_placeholders("Enter <your table> here"),
            "Enter &lt;your table&gt; here"
        );
    }

    #[test]
    fn keeps_real_elements_and_custom_elements() {
        assert_eq!(protect_placeholders("<b>bold</b> <br>"), "<b>bold</b> <br>");
        let custom = "<my-widget>x</my-widget>";
        assert_eq!(protect_placeholders(custom), custom);
    }

    #[test]
    fn leaves_tags_with_attributes_alone() {
        let html = r#"<span class="ph">value</span>"#;
        assert!(matches!(protect_placeholders(html), Cow::Borrowed(_)));
    }
}
