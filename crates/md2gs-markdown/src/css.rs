//! Minimal CSS stylesheet for highlight themes.
//!
//! Only class selectors and the handful of properties that map onto text
//! run attributes are understood; everything else is ignored.

use std::sync::OnceLock;

use md2gs_text::{RgbColor, TextStyle};
use regex::Regex;
use tracing::debug;

static COMMENT: OnceLock<Regex> = OnceLock::new();
static RULE: OnceLock<Regex> = OnceLock::new();
static RGB: OnceLock<Regex> = OnceLock::new();

/// Theme shipped with the crate
pub const DEFAULT_THEME: &str = include_str!("../themes/default.css");

/// Normalize a class name: `-` becomes `_`, an `hljs_` prefix is dropped
pub fn normalize_class(class: &str) -> String {
    let normalized = class.trim().replace('-', "_");
    match normalized.strip_prefix("hljs_") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => normalized,
    }
}

/// Class rules in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    rules: Vec<(String, TextStyle)>,
}

impl Stylesheet {
    /// Parse CSS text. Malformed rules are skipped.
    pub fn parse(css: &str) -> Self {
        let comment = COMMENT.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
        let rule = RULE.get_or_init(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap());

        let css = comment.replace_all(css, "");
        let mut rules = Vec::new();

        for caps in rule.captures_iter(&css) {
            let style = parse_declarations(&caps[2]);
            if style.is_empty() {
                continue;
            }
            for selector in caps[1].split(',') {
                if let Some(class) = selector_class(selector) {
                    rules.push((class, style.clone()));
                }
            }
        }

        debug!(rules = rules.len(), "Parsed stylesheet");
        Self { rules }
    }

    /// The theme shipped with the crate
    pub fn default_theme() -> Self {
        Self::parse(DEFAULT_THEME)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Style for an element carrying `classes`.
    ///
    /// Rules are layered in class order, so a later class overrides an
    /// earlier one.
    pub fn style_for<S: AsRef<str>>(&self, classes: &[S]) -> TextStyle {
        let mut style = TextStyle::default();
        for class in classes {
            let class = normalize_class(class.as_ref());
            for (_, rule) in self.rules.iter().filter(|(name, _)| *name == class) {
                style = rule.merged_onto(&style);
            }
        }
        style
    }
}

/// The last simple class of a selector such as `.hljs .hljs-keyword`
fn selector_class(selector: &str) -> Option<String> {
    let last = selector.split_whitespace().last()?;
    let class = last.rsplit('.').next()?;
    if !last.contains('.') || class.is_empty() || class.contains(':') {
        return None;
    }
    Some(normalize_class(class))
}

/// Parse a declaration list such as `color: red; font-weight: bold`
pub fn parse_declarations(block: &str) -> TextStyle {
    let mut style = TextStyle::default();
    for declaration in block.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_end_matches("!important").trim();
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => style.foreground_color = parse_color(value),
            "background" | "background-color" => style.background_color = parse_color(value),
            "font-weight" => {
                style.bold = match value {
                    "bold" | "bolder" => Some(true),
                    "normal" | "lighter" => Some(false),
                    v => v.parse::<u32>().ok().map(|w| w >= 600),
                }
            }
            "font-style" => style.italic = Some(value == "italic" || value == "oblique"),
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    style.underline = Some(true);
                }
                if value.contains("line-through") {
                    style.strikethrough = Some(true);
                }
                if value == "none" {
                    style.underline = Some(false);
                    style.strikethrough = Some(false);
                }
            }
            _ => {}
        }
    }
    style
}

fn parse_color(value: &str) -> Option<RgbColor> {
    if value.starts_with('#') {
        return RgbColor::from_hex(value);
    }
    let rgb = RGB.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").unwrap()
    });
    if let Some(caps) = rgb.captures(value) {
        let channel = |i: usize| caps[i].parse::<u16>().ok().map(|v| v.min(255) as u8);
        return Some(RgbColor::from_rgb8(channel(1)?, channel(2)?, channel(3)?));
    }
    match value.to_ascii_lowercase().as_str() {
        "black" => Some(RgbColor::from_rgb8(0, 0, 0)),
        "white" => Some(RgbColor::from_rgb8(255, 255, 255)),
        "red" => Some(RgbColor::from_rgb8(255, 0, 0)),
        "green" => Some(RgbColor::from_rgb8(0, 128, 0)),
        "blue" => Some(RgbColor::from_rgb8(0, 0, 255)),
        "gray" | "grey" => Some(RgbColor::from_rgb8(128, 128, 128)),
        _ => None,
    }
}
