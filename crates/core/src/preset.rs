//! Preset layout types and structural validation.
//!
//! A preset maps the three semantic form fields (date, time, address) onto a
//! template image: position, font file, pixel size and colour per field.
//! [`validate_preset`] is the single gate every preset passes before it is
//! persisted or rendered. Asset existence is not checked here;
//! fonts and templates are resolved lazily by the composition engine.

use std::sync::LazyLock;

use image::Rgba;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
   Types
   -------------------------------------------------------------------------- */

/// Which form field a text item draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Date,
    Time,
    Address,
}

impl TextKind {
    /// Every kind a preset must lay out, each exactly once.
    pub const ALL: [TextKind; 3] = [TextKind::Date, TextKind::Time, TextKind::Address];

    pub fn as_str(self) -> &'static str {
        match self {
            TextKind::Date => "date",
            TextKind::Time => "time",
            TextKind::Address => "address",
        }
    }
}

impl std::fmt::Display for TextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of text placed on the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextItem {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub x: i32,
    pub y: i32,
    /// Font filename, resolved against the font store at render time.
    pub font: String,
    /// Pixel size; must be at least [`MIN_FONT_SIZE`].
    pub size: i32,
    /// `#RGB` or `#RRGGBB`.
    pub color: String,
}

/// A named layout: template filename plus ordered text items.
///
/// Later items are drawn over earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub template: String,
    pub texts: Vec<TextItem>,
}

impl Preset {
    /// Consume the preset, returning it only if it passes [`validate_preset`].
    pub fn validated(self) -> Result<Self, CoreError> {
        validate_preset(&self)?;
        Ok(self)
    }
}

/* --------------------------------------------------------------------------
   Validation
   -------------------------------------------------------------------------- */

/// Smallest accepted font size.
pub const MIN_FONT_SIZE: i32 = 1;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

/// Validate a hex colour literal: `#` followed by exactly 3 or 6 hex digits.
pub fn validate_color(color: &str) -> Result<(), CoreError> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "color must be HEX like #FFF or #RRGGBB, got '{color}'"
        )))
    }
}

/// Parse a validated hex colour into an opaque RGBA pixel.
///
/// Short form expands each nibble, so `#abc` equals `#aabbcc`.
pub fn parse_color(color: &str) -> Result<Rgba<u8>, CoreError> {
    validate_color(color)?;
    let digits = &color[1..];
    let channel = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|e| CoreError::Validation(format!("bad color channel '{s}': {e}")))
    };

    let [r, g, b] = if digits.len() == 3 {
        let mut out = [0u8; 3];
        for (i, c) in digits.chars().enumerate() {
            let nibble = channel(&c.to_string())?;
            out[i] = nibble * 0x11;
        }
        out
    } else {
        [
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ]
    };
    Ok(Rgba([r, g, b, 0xFF]))
}

/// Validate a single text item: size lower bound and colour format.
pub fn validate_text_item(item: &TextItem) -> Result<(), CoreError> {
    if item.size < MIN_FONT_SIZE {
        return Err(CoreError::Validation(format!(
            "size of '{}' text must be >= {MIN_FONT_SIZE}, got {}",
            item.kind, item.size
        )));
    }
    validate_color(&item.color)
}

/// Validate that the text kinds are exactly one each of date, time, address.
///
/// Duplicates fail on the first repeat in input order. Missing kinds are
/// listed sorted and comma-joined.
pub fn validate_text_kinds(texts: &[TextItem]) -> Result<(), CoreError> {
    let mut seen: Vec<TextKind> = Vec::with_capacity(TextKind::ALL.len());
    for item in texts {
        if seen.contains(&item.kind) {
            return Err(CoreError::Validation(format!(
                "duplicate text type '{}': texts must contain unique types (date, time, address)",
                item.kind
            )));
        }
        seen.push(item.kind);
    }

    let mut missing: Vec<&str> = TextKind::ALL
        .iter()
        .filter(|kind| !seen.contains(kind))
        .map(|kind| kind.as_str())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    Err(CoreError::Validation(format!(
        "missing text types: {}",
        missing.join(", ")
    )))
}

/// Full structural check of a preset.
pub fn validate_preset(preset: &Preset) -> Result<(), CoreError> {
    if preset.name.is_empty() {
        return Err(CoreError::Validation(
            "Preset name must not be empty".to_string(),
        ));
    }
    if preset.template.is_empty() {
        return Err(CoreError::Validation(
            "Preset template must not be empty".to_string(),
        ));
    }
    for item in &preset.texts {
        validate_text_item(item)?;
    }
    validate_text_kinds(&preset.texts)
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */
