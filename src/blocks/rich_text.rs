//! Text runs and rich-text helpers
//!
//! A rich-text field is an ordered `Vec<TextRun>`; concatenating the run
//! contents gives back the plain text of the field.

use serde::{Deserialize, Serialize};

use super::annotations::Annotations;
use crate::utils::{MAX_RICH_TEXT_RUNS, MAX_TEXT_CONTENT_CHARS, chunk_by_chars};

/// One styled span of text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Ordered runs forming one rich-text field
pub type RichText = Vec<TextRun>;

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }

    pub fn styled(content: impl Into<String>, annotations: Annotations) -> Self {
        Self {
            content: content.into(),
            annotations,
            link: None,
        }
    }

    #[must_use]
    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Same annotations and same link target
    #[must_use]
    pub fn same_style(&self, other: &TextRun) -> bool {
        self.annotations == other.annotations && self.link == other.link
    }
}

/// Concatenated content of all runs
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.content.as_str()).collect()
}

/// True when the runs carry no visible text
pub fn is_blank(runs: &[TextRun]) -> bool {
    runs.iter().all(|r| r.content.trim().is_empty())
}

/// Split every run longer than the host limit into ⌈len/2000⌉ runs.
///
/// Chunks inherit the annotations; only the first chunk keeps the link.
pub fn split_long_runs(runs: RichText) -> RichText {
    let mut out = Vec::with_capacity(runs.len());

    for run in runs {
        if run.char_len() <= MAX_TEXT_CONTENT_CHARS {
            out.push(run);
            continue;
        }

        for (i, chunk) in chunk_by_chars(&run.content, MAX_TEXT_CONTENT_CHARS)
            .into_iter()
            .enumerate()
        {
            out.push(TextRun {
                content: chunk.to_string(),
                annotations: run.annotations,
                link: if i == 0 { run.link.clone() } else { None },
            });
        }
    }

    out
}

/// Trim leading whitespace of the first run and trailing whitespace of the
/// last, dropping runs that become empty.
pub fn trim_rich_text(mut runs: RichText) -> RichText {
    while let Some(first) = runs.first_mut() {
        let trimmed = first.content.trim_start().to_string();
        if trimmed.is_empty() && first.link.is_none() {
            runs.remove(0);
        } else {
            first.content = trimmed;
            break;
        }
    }

    while let Some(last) = runs.last_mut() {
        let trimmed = last.content.trim_end().to_string();
        if trimmed.is_empty() && last.link.is_none() {
            runs.pop();
        } else {
            last.content = trimmed;
            break;
        }
    }

    runs
}

/// The runs one rich-text field can hold, and the runs that must continue
/// in a following block
pub fn split_at_run_limit(mut runs: RichText) -> (RichText, RichText) {
    if runs.len() <= MAX_RICH_TEXT_RUNS {
        return (runs, Vec::new());
    }
    let rest = runs.split_off(MAX_RICH_TEXT_RUNS);
    (runs, rest)
}

/// Fit `runs` into one field for blocks that cannot continue elsewhere
/// (table cells).
///
/// Runs past the limit are flattened into a single plain run in the last
/// slot. Returns the fitted runs and the number of characters that still did
/// not fit and were dropped.
pub fn fold_to_run_limit(mut runs: RichText) -> (RichText, usize) {
    if runs.len() <= MAX_RICH_TEXT_RUNS {
        return (runs, 0);
    }
    let tail = plain_text(&runs.split_off(MAX_RICH_TEXT_RUNS - 1));
    let mut chunks = chunk_by_chars(&tail, MAX_TEXT_CONTENT_CHARS).into_iter();
    let mut dropped = 0;
    if let Some(first) = chunks.next() {
        runs.push(TextRun::plain(first));
        dropped = chunks.map(|c| c.chars().count()).sum();
    }
    (runs, dropped)
}

/// Single plain run, or nothing for empty text
pub fn rich_text_from_str(text: &str) -> RichText {
    if text.is_empty() {
        Vec::new()
    } else {
        split_long_runs(vec![TextRun::plain(text)])
    }
}
