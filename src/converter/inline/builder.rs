//! Run builder driven by the inline token stream

use super::finalize::Piece;
use super::tokens::{InlineTag, InlineToken};
use super::{InlineMode, InlineOptions, InlineOutput, MediaRef};
use crate::blocks::{Annotations, Color, TextRun};
use crate::utils::{LinkTarget, classify_link};

/// Styles in effect at the current point of the stream.
///
/// An opening tag sets its flag and the matching closing tag clears it;
/// nesting the same style twice does not stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationState {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
    pub link: Option<String>,
    pub pre: bool,
}

impl AnnotationState {
    fn annotations(&self) -> Annotations {
        Annotations {
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strikethrough,
            underline: self.underline,
            code: self.code,
            color: self.color,
        }
    }
}

pub(super) struct RunBuilder<'o> {
    options: &'o InlineOptions<'o>,
    state: AnnotationState,
    pieces: Vec<Piece>,
    media: Vec<MediaRef>,
    /// Last character written, used to collapse whitespace across tokens
    last_char: Option<char>,
    /// Characters written since the current link opened
    link_chars: usize,
}

impl<'o> RunBuilder<'o> {
    pub(super) fn new(options: &'o InlineOptions<'o>) -> Self {
        Self {
            options,
            state: AnnotationState::default(),
            pieces: Vec::new(),
            media: Vec::new(),
            last_char: None,
            link_chars: 0,
        }
    }

    pub(super) fn feed(&mut self, tokens: Vec<InlineToken>) {
        for token in tokens {
            match token {
                InlineToken::Open(tag) => self.open(tag),
                InlineToken::Close(tag) => self.close(tag),
                InlineToken::Text(text) => self.text(&text),
                InlineToken::LineBreak => self.push_raw("\n"),
                InlineToken::BlockBoundary => self.boundary(),
                InlineToken::ListItem => {
                    if self.options.mode == InlineMode::Newlines {
                        self.push_raw("• ");
                    }
                }
                InlineToken::Media(media) => {
                    if self.options.media_alt_text && !media.alt.is_empty() {
                        let alt = media.alt.clone();
                        self.text(&alt);
                    }
                    self.media.push(media);
                }
            }
        }
    }

    pub(super) fn finish(self) -> InlineOutput {
        InlineOutput {
            rich_text: super::finalize::finalize(self.pieces),
            media: self.media,
        }
    }

    fn open(&mut self, tag: InlineTag) {
        match tag {
            InlineTag::Bold => self.state.bold = true,
            InlineTag::Italic => self.state.italic = true,
            InlineTag::Strikethrough => self.state.strikethrough = true,
            InlineTag::Underline => self.state.underline = true,
            InlineTag::Code => self.state.code = true,
            InlineTag::Pre => self.state.pre = true,
            InlineTag::Color(color) => self.state.color = color,
            InlineTag::Link(href) => {
                self.link_chars = 0;
                self.state.link = match classify_link(&href, self.options.base_url) {
                    LinkTarget::Absolute(url) => Some(url),
                    LinkTarget::Demoted => {
                        tracing::trace!(href = %href, "link demoted to plain text");
                        None
                    }
                };
            }
        }
    }

    fn close(&mut self, tag: InlineTag) {
        match tag {
            InlineTag::Bold => self.state.bold = false,
            InlineTag::Italic => self.state.italic = false,
            InlineTag::Strikethrough => self.state.strikethrough = false,
            InlineTag::Underline => self.state.underline = false,
            InlineTag::Code => self.state.code = false,
            InlineTag::Pre => self.state.pre = false,
            InlineTag::Color(_) => self.state.color = Color::Default,
            InlineTag::Link(_) => {
                if self.link_chars == 0 {
                    if let Some(url) = self.state.link.clone() {
                        self.push_piece(url, false);
                    }
                }
                self.state.link = None;
            }
        }
    }

    fn boundary(&mut self) {
        match self.options.mode {
            InlineMode::Collapse => self.push_raw(" "),
            InlineMode::Newlines => {
                if self.last_char.is_some_and(|c| c != '\n') {
                    self.push_raw("\n");
                }
            }
        }
    }

    /// Text that bypasses identifier detection (separators, bullets)
    fn push_raw(&mut self, text: &str) {
        if text == " " && self.last_char.is_none_or(char::is_whitespace) {
            return;
        }
        self.push_piece(text.to_string(), false);
    }

    fn text(&mut self, text: &str) {
        if self.state.pre {
            self.push_piece(text.to_string(), false);
            return;
        }

        let collapsed = self.collapse(text);
        if collapsed.is_empty() {
            return;
        }

        if self.state.code || self.state.link.is_some() || !self.options.policy.enabled {
            self.push_piece(collapsed, false);
            return;
        }

        for segment in self.options.policy.split(&collapsed) {
            self.push_piece(segment.text.to_string(), segment.identifier);
        }
    }

    /// Collapse whitespace runs, continuing from the previous token
    fn collapse(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut prev_space = self.last_char.is_none_or(char::is_whitespace);
        for ch in text.chars() {
            if ch.is_whitespace() || ch == '\u{a0}' {
                if !prev_space {
                    out.push(' ');
                }
                prev_space = true;
            } else {
                out.push(ch);
                prev_space = false;
            }
        }
        out
    }

    fn push_piece(&mut self, content: String, auto_code: bool) {
        let Some(last) = content.chars().next_back() else {
            return;
        };
        self.last_char = Some(last);
        if self.state.link.is_some() {
            self.link_chars += content.chars().count();
        }

        let mut annotations = self.state.annotations();
        if auto_code {
            annotations.code = true;
        }
        self.pieces.push(Piece {
            run: TextRun {
                content,
                annotations,
                link: self.state.link.clone(),
            },
            auto_code,
        });
    }
}
