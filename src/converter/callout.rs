//! Callout (admonition) recognition by class name

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use crate::blocks::Color;

/// Icon and colour used for containers carrying `class`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutStyle {
    pub class: String,
    pub icon: String,
    pub color: Color,
}

impl CalloutStyle {
    pub fn new(class: impl Into<String>, icon: impl Into<String>, color: Color) -> Self {
        Self {
            class: class.into(),
            icon: icon.into(),
            color,
        }
    }

    /// Admonition classes emitted by common documentation generators
    pub fn defaults() -> Vec<CalloutStyle> {
        vec![
            CalloutStyle::new("note", "ℹ️", Color::BlueBackground),
            CalloutStyle::new("info", "ℹ️", Color::BlueBackground),
            CalloutStyle::new("tip", "💡", Color::GreenBackground),
            CalloutStyle::new("important", "❗", Color::RedBackground),
            CalloutStyle::new("warning", "⚠️", Color::YellowBackground),
            CalloutStyle::new("caution", "⚠️", Color::OrangeBackground),
            CalloutStyle::new("danger", "🚫", Color::RedBackground),
            CalloutStyle::new("attention", "🚫", Color::RedBackground),
        ]
    }
}

/// The first configured style whose class the element carries
pub fn match_callout<'s>(el: &ElementRef<'_>, styles: &'s [CalloutStyle]) -> Option<&'s CalloutStyle> {
    let classes: Vec<String> = el.value().classes().map(str::to_ascii_lowercase).collect();
    if classes.is_empty() {
        return None;
    }
    styles
        .iter()
        .find(|style| classes.iter().any(|c| c.eq_ignore_ascii_case(&style.class)))
}
