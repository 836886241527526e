//! Run annotations and the normaliser that keeps them fully populated
//!
//! Every run written to the host carries all six annotation fields. Partial
//! input (from converters, tests, or host responses) goes through
//! [`Annotations::normalize`], which defaults unset booleans to `false` and
//! unknown colours to [`Color::Default`].

use serde::{Deserialize, Deserializer, Serialize};

/// Text colour vocabulary accepted by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

impl Color {
    pub const ALL: [Color; 19] = [
        Color::Default,
        Color::Gray,
        Color::Brown,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
        Color::Pink,
        Color::Red,
        Color::GrayBackground,
        Color::BrownBackground,
        Color::OrangeBackground,
        Color::YellowBackground,
        Color::GreenBackground,
        Color::BlueBackground,
        Color::PurpleBackground,
        Color::PinkBackground,
        Color::RedBackground,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
            Color::GrayBackground => "gray_background",
            Color::BrownBackground => "brown_background",
            Color::OrangeBackground => "orange_background",
            Color::YellowBackground => "yellow_background",
            Color::GreenBackground => "green_background",
            Color::BlueBackground => "blue_background",
            Color::PurpleBackground => "purple_background",
            Color::PinkBackground => "pink_background",
            Color::RedBackground => "red_background",
        }
    }

    /// Parse a host colour name, case-insensitively (`grey` is accepted too)
    #[must_use]
    pub fn parse(name: &str) -> Option<Color> {
        let name = name.trim().to_ascii_lowercase();
        if name == "grey" {
            return Some(Color::Gray);
        }
        Color::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

/// Fully populated style flags of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "PartialAnnotations")]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

/// Possibly incomplete style flags, as produced before normalisation
///
/// Deserialisation is lenient: a field with the wrong JSON type is treated
/// as unset instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PartialAnnotations {
    #[serde(deserialize_with = "lenient_bool")]
    pub bold: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub italic: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub strikethrough: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub underline: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub code: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub color: Option<String>,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl Annotations {
    /// Canonicalise a partial flag set into the fixed schema
    #[must_use]
    pub fn normalize(partial: PartialAnnotations) -> Annotations {
        Annotations {
            bold: partial.bold.unwrap_or(false),
            italic: partial.italic.unwrap_or(false),
            strikethrough: partial.strikethrough.unwrap_or(false),
            underline: partial.underline.unwrap_or(false),
            code: partial.code.unwrap_or(false),
            color: partial
                .color
                .as_deref()
                .and_then(Color::parse)
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    #[must_use]
    pub fn italic() -> Self {
        Self { italic: true, ..Self::default() }
    }

    #[must_use]
    pub fn code() -> Self {
        Self { code: true, ..Self::default() }
    }

    /// True when no flag is set and the colour is the default
    #[must_use]
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

impl From<PartialAnnotations> for Annotations {
    fn from(partial: PartialAnnotations) -> Self {
        Annotations::normalize(partial)
    }
}

impl From<Annotations> for PartialAnnotations {
    fn from(a: Annotations) -> Self {
        PartialAnnotations {
            bold: Some(a.bold),
            italic: Some(a.italic),
            strikethrough: Some(a.strikethrough),
            underline: Some(a.underline),
            code: Some(a.code),
            color: Some(a.color.as_str().to_string()),
        }
    }
}
