//! Technical-identifier detection
//!
//! Documentation prose mentions field and table names (`sys_id.value`,
//! `incident_task`) without marking them up. Tokens that look like code are
//! split out so they can be stamped with the `code` annotation. The
//! thresholds were tuned against real documents, not derived from a rule, so
//! they live in an overridable [`IdentifierPolicy`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Word characters joined by `.` or `_`
static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_]+(?:[._][A-Za-z0-9_]+)+")
        .expect("BUG: identifier candidate regex is statically valid")
});

/// Heuristic deciding which bare tokens are rendered as inline code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierPolicy {
    pub enabled: bool,
    /// Minimum token length in characters
    pub min_len: usize,
    /// Minimum number of `.`/`_`-separated segments
    pub min_segments: usize,
    /// Require at least one digit or underscore, which keeps ordinary
    /// dotted prose (`some.regular.words`) out
    pub require_digit_or_underscore: bool,
    /// Last segments that mark a file name rather than an identifier
    pub file_extensions: Vec<String>,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_len: 6,
            min_segments: 2,
            require_digit_or_underscore: true,
            file_extensions: [
                "bat", "cfg", "conf", "css", "csv", "doc", "docx", "exe", "gif", "gz", "htm",
                "html", "ico", "ini", "jar", "java", "jpeg", "jpg", "js", "json", "log", "md",
                "mp4", "pdf", "png", "ppt", "pptx", "properties", "ps1", "py", "sh", "sql",
                "svg", "tar", "ts", "txt", "war", "xls", "xlsx", "xml", "yaml", "yml", "zip",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// A slice of text, flagged when it is an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub identifier: bool,
}

impl IdentifierPolicy {
    /// Policy that never matches
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether `token` on its own qualifies, ignoring its surroundings
    #[must_use]
    pub fn qualifies(&self, token: &str) -> bool {
        if !self.enabled || token.chars().count() < self.min_len {
            return false;
        }

        let segments: Vec<&str> = token.split(['.', '_']).filter(|s| !s.is_empty()).collect();
        if segments.len() < self.min_segments {
            return false;
        }

        if self.require_digit_or_underscore
            && !token.chars().any(|c| c.is_ascii_digit() || c == '_')
        {
            return false;
        }

        if let Some((_, ext)) = token.rsplit_once('.') {
            let ext = ext.to_ascii_lowercase();
            if self.file_extensions.iter().any(|e| *e == ext) {
                return false;
            }
        }

        true
    }

    /// Split `text` into plain and identifier segments.
    ///
    /// A candidate is rejected when it sits next to a URL delimiter (`/`,
    /// `?`, `&`, `=`, `#`), follows a protocol prefix, or is glued to other
    /// word characters.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut out = Vec::new();
        if !self.enabled {
            out.push(Segment { text, identifier: false });
            return out;
        }

        let mut cursor = 0;
        for m in CANDIDATE.find_iter(text) {
            if !self.qualifies(m.as_str()) || url_adjacent(text, m.start(), m.end()) {
                continue;
            }
            if m.start() > cursor {
                out.push(Segment { text: &text[cursor..m.start()], identifier: false });
            }
            out.push(Segment { text: m.as_str(), identifier: true });
            cursor = m.end();
        }

        if cursor < text.len() {
            out.push(Segment { text: &text[cursor..], identifier: false });
        }
        out
    }
}

fn url_adjacent(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    if matches!(before, Some('/' | '?' | '&' | '=' | '#' | '@' | ':' | '-' | '.'))
        || before.is_some_and(|c| c.is_alphanumeric())
    {
        return true;
    }
    if matches!(after, Some('/' | '?' | '&' | '=' | '#' | '@' | '-'))
        || after.is_some_and(|c| c.is_alphanumeric())
    {
        return true;
    }

    // The whitespace-delimited word holding the match
    let word_start = text[..start].rfind(char::is_whitespace).map_or(0, |i| i + 1);
    let word_end = text[end..].find(char::is_whitespace).map_or(text.len(), |i| end + i);
    let word = &text[word_start..word_end];
    word.contains("://") || word.starts_with("www.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(text: &str) -> Vec<&str> {
        IdentifierPolicy::default()
            .split(text)
            .into_iter()
            .filter(|s| s.identifier)
            .map(|s| s.text)
            .collect()
    }

    #[test]
    fn detects_field_names() {
        assert_eq!(identifiers("Use field sys_id.value here"), vec!["sys_id.value"]);
        assert_eq!(identifiers("Set glide.ui.v2.enabled to true"), vec!["glide.ui.v2.enabled"]);
    }

    #[test]
    fn ignores_plain_dotted_words() {
        assert!(identifiers("some.regular.words").is_empty());
    }

    #[test]
    fn ignores_short_tokens_and_file_names() {
        assert!(identifiers("a_b is short").is_empty());
        assert!(identifiers("Open my_script_v2.js now").is_empty());
    }

    #[test]
    fn ignores_url_fragments() {
        assert!(identifiers("See https://example.com/sys_id.value for details").is_empty());
        assert!(identifiers("query?sys_id.value=1").is_empty());
    }

    #[test]
    fn bracketed_tokens_keep_brackets_plain() {
        let segments = IdentifierPolicy::default().split("[incident_task.state]");
        assert_eq!(
            segments,
            vec![
                Segment { text: "[", identifier: false },
                Segment { text: "incident_task.state", identifier: true },
                Segment { text: "]", identifier: false },
            ]
        );
    }

    #[test]
    fn trailing_sentence_period_is_not_part_of_token() {
        assert_eq!(identifiers("Check u_custom_field."), vec!["u_custom_field"]);
    }

    #[test]
    fn disabled_policy_matches_nothing() {
        assert!(!IdentifierPolicy::disabled().qualifies("sys_id.value"));
    }
}
