//! Clean-up passes over built runs

use crate::blocks::rich_text::{split_long_runs, trim_rich_text};
use crate::blocks::{RichText, TextRun};
use crate::utils::MAX_TEXT_CONTENT_CHARS;

/// A run plus whether its `code` flag came from identifier detection
#[derive(Debug, Clone)]
pub(super) struct Piece {
    pub run: TextRun,
    pub auto_code: bool,
}

/// Characters that may sit directly before an identifier
const OPENERS: &[char] = &['(', '[', '{', '"', '\'', '`', '<'];
/// Characters that may sit directly after an identifier
const CLOSERS: &[char] = &[')', ']', '}', '"', '\'', '`', '>', '.', ',', ';', ':', '!', '?'];

/// Repair, drop, merge, trim, then split runs over the length limit
pub(super) fn finalize(mut pieces: Vec<Piece>) -> RichText {
    demote_glued_identifiers(&mut pieces);

    let mut runs: RichText = Vec::with_capacity(pieces.len());
    for Piece { run, .. } in pieces {
        if run.content.is_empty() && run.link.is_none() {
            continue;
        }

        if let Some(prev) = runs.last_mut() {
            let whitespace_only = run.link.is_none() && run.content.trim().is_empty();
            let fits = prev.char_len() + run.char_len() <= MAX_TEXT_CONTENT_CHARS;
            if fits && (whitespace_only || prev.same_style(&run)) {
                prev.content.push_str(&run.content);
                continue;
            }
        }
        runs.push(run);
    }

    split_long_runs(trim_rich_text(runs))
}

/// An auto-detected identifier that touches other text with no whitespace
/// between them is part of a larger word: turn it back into plain text.
fn demote_glued_identifiers(pieces: &mut [Piece]) {
    for i in 0..pieces.len() {
        if !pieces[i].auto_code {
            continue;
        }

        let before = i
            .checked_sub(1)
            .and_then(|j| pieces[j].run.content.chars().next_back());
        let after = pieces.get(i + 1).and_then(|p| p.run.content.chars().next());

        let glued_before = before.is_some_and(|c| !c.is_whitespace() && !OPENERS.contains(&c));
        let glued_after = after.is_some_and(|c| !c.is_whitespace() && !CLOSERS.contains(&c));

        if glued_before || glued_after {
            pieces[i].auto_code = false;
            pieces[i].run.annotations.code = false;
        }
    }
}
