//! Code block language detection
//!
//! The language is read from the `<pre>`/`<code>` classes first
//! (`language-js`, `lang-python`, `highlight-source-shell`, `brush: java`).
//! Without a class hint, a small weighted pattern score picks the language.
//! Names are mapped onto the host's language list; anything unknown is
//! `plain text`.

use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

pub const PLAIN_TEXT: &str = "plain text";

/// Languages the host accepts, by their host name
const HOST_LANGUAGES: &[&str] = &[
    "bash", "c", "c#", "c++", "css", "diff", "docker", "go", "graphql", "groovy", "html",
    "java", "javascript", "json", "kotlin", "makefile", "markdown", "php", "plain text",
    "powershell", "python", "ruby", "rust", "scala", "shell", "sql", "swift", "typescript",
    "xml", "yaml",
];

/// Common aliases onto host names
const ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("node", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("sh", "shell"),
    ("zsh", "shell"),
    ("console", "shell"),
    ("shell-session", "shell"),
    ("ps1", "powershell"),
    ("cs", "c#"),
    ("csharp", "c#"),
    ("cpp", "c++"),
    ("cxx", "c++"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("yml", "yaml"),
    ("htm", "html"),
    ("xhtml", "html"),
    ("dockerfile", "docker"),
    ("golang", "go"),
    ("kt", "kotlin"),
    ("md", "markdown"),
    ("text", "plain text"),
    ("plaintext", "plain text"),
    ("none", "plain text"),
];

const CLASS_PREFIXES: &[&str] = &["language-", "lang-", "highlight-source-", "highlight-", "brush:"];

/// Map a language name or alias to a host language
pub fn normalize_language(name: &str) -> Option<&'static str> {
    let name = name.trim().to_ascii_lowercase();
    if let Some(found) = HOST_LANGUAGES.iter().find(|l| **l == name) {
        return Some(found);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, host)| *host)
}

fn from_element(el: &ElementRef<'_>) -> Option<&'static str> {
    if let Some(lang) = el.attr("data-language").or_else(|| el.attr("data-lang"))
        && let Some(found) = normalize_language(lang)
    {
        return Some(found);
    }

    // `brush: java` is written with a space after the colon
    let class_attr = el.attr("class").unwrap_or_default().replace("brush: ", "brush:");
    for class in class_attr.split_whitespace() {
        let lower = class.to_ascii_lowercase();
        let hinted = CLASS_PREFIXES
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix));
        if let Some(name) = hinted
            && let Some(found) = normalize_language(name.trim_end_matches(';'))
        {
            return Some(found);
        }
    }
    None
}

struct Signal {
    language: &'static str,
    pattern: Regex,
    weight: i32,
}

fn signal(language: &'static str, pattern: &str, weight: i32) -> Signal {
    Signal {
        language,
        pattern: Regex::new(pattern).expect("BUG: language signal regex is statically valid"),
        weight,
    }
}

static SIGNALS: LazyLock<Vec<Signal>> = LazyLock::new(|| {
    vec![
        signal("shell", r"(?m)^\s*\$ \S", 8),
        signal("bash", r"^#!/bin/(ba)?sh", 10),
        signal("python", r"(?m)^\s*def \w+\(.*\):\s*$", 8),
        signal("python", r"(?m)^\s*(from \w+ )?import \w+", 4),
        signal("javascript", r"\b(const|let|var) \w+ = ", 5),
        signal("javascript", r"\bfunction\s*\w*\s*\(", 5),
        signal("javascript", r"=>\s*\{", 4),
        signal("java", r"\bpublic (static )?(class|void) ", 8),
        signal("json", r"^\s*[\{\[]\s*\x22[^\x22]+\x22\s*:", 8),
        signal("xml", r"^\s*<\?xml", 10),
        signal("html", r"(?i)^\s*<(!doctype|html|div|p)\b", 6),
        signal("sql", r"(?i)\b(select .+ from|insert into|update \w+ set|create table)\b", 8),
        signal("yaml", r"(?m)^[\w-]+:\s*$\n^\s+[\w-]+:", 5),
        signal("css", r"(?m)^[.#]?[\w-]+\s*\{\s*$", 5),
        signal("rust", r"\bfn \w+\(.*\)\s*(->|\{)", 8),
        signal("go", r"(?m)^func \w+\(", 8),
        signal("powershell", r"\b(Get|Set|New)-[A-Z]\w+", 8),
    ]
});

/// Threshold below which the guess is not trusted
const MIN_SCORE: i32 = 5;

/// Guess the language of a code sample from its content
pub fn guess_language(code: &str) -> Option<&'static str> {
    let mut scores: Vec<(&'static str, i32)> = Vec::new();
    for s in SIGNALS.iter() {
        if s.pattern.is_match(code) {
            match scores.iter_mut().find(|(l, _)| *l == s.language) {
                Some((_, score)) => *score += s.weight,
                None => scores.push((s.language, s.weight)),
            }
        }
    }
    scores
        .into_iter()
        .filter(|(_, score)| *score >= MIN_SCORE)
        .max_by_key(|(_, score)| *score)
        .map(|(lang, _)| lang)
}

/// Language for a `<pre>` element: class hints on the element or its
/// `<code>` child, then content heuristics
pub fn detect_language(pre: &ElementRef<'_>, code: &str) -> String {
    let from_child = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code")
        .and_then(|c| from_element(&c));

    from_element(pre)
        .or(from_child)
        .or_else(|| guess_language(code))
        .unwrap_or(PLAIN_TEXT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn pre_language(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("pre").unwrap();
        let pre = doc.select(&sel).next().unwrap();
        let text: String = pre.text().collect();
        detect_language(&pre, &text)
    }

    #[test]
    fn class_hints_win() {
        assert_eq!(pre_language(r#"<pre><code class="language-js">x</code></pre>"#), "javascript");
        assert_eq!(pre_language(r#"<pre class="brush: java;">x</pre>"#), "java");
    }

    #[test]
    fn content_heuristics() {
        assert_eq!(guess_language("SELECT name FROM users"), Some("sql"));
        assert_eq!(guess_language("def main():\n    pass\n"), Some("python"));
        assert_eq!(guess_language("hello world"), None);
    }

    #[test]
    fn unknown_defaults_to_plain_text() {
        assert_eq!(pre_language("<pre>just some words</pre>"), PLAIN_TEXT);
    }
}
