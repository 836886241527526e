//! Relocation ids and marker-token cleanup
//!
//! Content nested deeper than the host allows is moved out of its list item
//! during conversion and re-attached after the item exists on the host. The
//! link between the two is a [`RelocationId`] stored on the blocks themselves.
//! Its textual form `(sn2n:<id>)` only appears in logs, and in documents
//! written by older tooling; [`strip_marker_tokens`] removes such tokens
//! from rich text, even when a token is spread over several runs.

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rich_text::{RichText, TextRun};

/// Literal prefix of a marker token
pub const MARKER_PREFIX: &str = "(sn2n:";

/// A token, optionally preceded by one space; the closing paren may be lost
static MARKER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" ?\(sn2n:[A-Za-z0-9_-]*\)?").expect("BUG: marker token regex is statically valid")
});

/// Opaque id tying overflow blocks to the item that will own them
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelocationId(String);

impl RelocationId {
    /// Fresh id, unique within any realistic document
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..12].to_string())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Textual marker form, `(sn2n:<id>)`
    #[must_use]
    pub fn token(&self) -> String {
        format!("{MARKER_PREFIX}{})", self.0)
    }
}

impl fmt::Display for RelocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sn2n:{}", self.0)
    }
}

/// True when any run, or the seam between runs, contains a marker prefix
pub fn contains_marker(runs: &[TextRun]) -> bool {
    runs.iter().map(|r| r.content.as_str()).collect::<String>().contains(MARKER_PREFIX)
}

/// Remove every marker token from `runs`.
///
/// Tokens are located in the concatenation of run contents, so a token split
/// across adjacent runs is still found. Runs are then re-sliced around the
/// removed spans; each surviving fragment keeps the annotations and link of
/// the run it came from. Returns `None` when there was nothing to remove.
pub fn strip_marker_tokens(runs: &[TextRun]) -> Option<RichText> {
    let joined: String = runs.iter().map(|r| r.content.as_str()).collect();
    let removed: Vec<Range<usize>> = MARKER_TOKEN
        .find_iter(&joined)
        .map(|m| m.range())
        .collect();

    if removed.is_empty() {
        return None;
    }

    let mut out = Vec::with_capacity(runs.len());
    let mut offset = 0usize;

    for run in runs {
        let span = offset..offset + run.content.len();
        offset = span.end;

        let mut cursor = span.start;
        let mut kept = String::new();
        for cut in removed.iter().filter(|r| r.start < span.end && r.end > span.start) {
            let cut_start = cut.start.max(span.start);
            if cut_start > cursor {
                kept.push_str(&joined[cursor..cut_start]);
            }
            cursor = cursor.max(cut.end.min(span.end));
        }
        if cursor < span.end {
            kept.push_str(&joined[cursor..span.end]);
        }

        if !kept.is_empty() {
            out.push(TextRun {
                content: kept,
                annotations: run.annotations,
                link: run.link.clone(),
            });
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::annotations::Annotations;

    #[test]
    fn token_form_matches_marker_syntax() {
        let id = RelocationId::from_raw("abc123");
        assert_eq!(id.token(), "(sn2n:abc123)");
        assert_eq!(id.to_string(), "sn2n:abc123");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(RelocationId::generate(), RelocationId::generate());
    }

    #[test]
    fn strips_token_inside_single_run() {
        let runs = vec![TextRun::plain("Configure the item (sn2n:k2j4)")];
        let stripped = strip_marker_tokens(&runs).unwrap();
        assert_eq!(stripped, vec![TextRun::plain("Configure the item")]);
    }

    #[test]
    fn strips_token_spanning_runs_and_keeps_annotations() {
        let runs = vec![
            TextRun::styled("Step one (sn", Annotations::bold()),
            TextRun::plain("2n:ab"),
            TextRun::styled("c9) done", Annotations::italic()),
        ];

        let stripped = strip_marker_tokens(&runs).unwrap();

        assert_eq!(
            stripped,
            vec![
                TextRun::styled("Step one", Annotations::bold()),
                TextRun::styled(" done", Annotations::italic()),
            ]
        );
        assert!(!contains_marker(&stripped));
    }

    #[test]
    fn strips_unterminated_fragment() {
        let runs = vec![TextRun::plain("tail (sn2n:")];
        assert_eq!(strip_marker_tokens(&runs).unwrap(), vec![TextRun::plain("tail")]);
    }

    #[test]
    fn untouched_text_returns_none() {
        assert!(strip_marker_tokens(&[TextRun::plain("plain (note)")]).is_none());
    }
}
