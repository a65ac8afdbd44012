//! Styled text: raw text plus ranged style annotations.
//!
//! Offsets are UTF-16 code units, which is how the remote presentation API
//! indexes text. Runs may overlap; a later run layers its attributes over an
//! earlier one.

use serde::{Deserialize, Serialize};

use crate::utf16_len;

/// Unit of a font size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FontUnit {
    #[default]
    Pt,
}

/// A font size with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSize {
    pub magnitude: f64,
    pub unit: FontUnit,
}

impl FontSize {
    /// Create a size in points
    pub fn pt(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: FontUnit::Pt,
        }
    }
}

/// An opaque RGB color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl RgbColor {
    /// Create a color from 8-bit channels
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f32::from(red) / 255.0,
            green: f32::from(green) / 255.0,
            blue: f32::from(blue) / 255.0,
        }
    }

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut chars = hex.chars().map(|c| c.to_digit(16));
                let r = chars.next()??;
                let g = chars.next()??;
                let b = chars.next()??;
                Some(Self::from_rgb8((r * 17) as u8, (g * 17) as u8, (b * 17) as u8))
            }
            6 if hex.is_ascii() => Some(Self::from_rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`
    pub fn to_hex(&self) -> String {
        let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", to8(self.red), to8(self.green), to8(self.blue))
    }
}

/// Character-level style attributes; unset fields inherit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<RgbColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<RgbColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextStyle {
    /// Style with bold set
    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Default::default()
        }
    }

    /// Style with italic set
    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Default::default()
        }
    }

    /// Style with a font family
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..Default::default()
        }
    }

    /// Style with a hyperlink
    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..Default::default()
        }
    }

    /// True when no attribute is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `self` on `parent`: attributes set here win
    pub fn merged_onto(&self, parent: &TextStyle) -> TextStyle {
        TextStyle {
            bold: self.bold.or(parent.bold),
            italic: self.italic.or(parent.italic),
            underline: self.underline.or(parent.underline),
            strikethrough: self.strikethrough.or(parent.strikethrough),
            font_family: self.font_family.clone().or_else(|| parent.font_family.clone()),
            font_size: self.font_size.or(parent.font_size),
            foreground_color: self.foreground_color.or(parent.foreground_color),
            background_color: self.background_color.or(parent.background_color),
            link: self.link.clone().or_else(|| parent.link.clone()),
        }
    }

    /// Names of the set attributes, in remote API field naming
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.underline.is_some() {
            fields.push("underline");
        }
        if self.strikethrough.is_some() {
            fields.push("strikethrough");
        }
        if self.font_family.is_some() {
            fields.push("fontFamily");
        }
        if self.font_size.is_some() {
            fields.push("fontSize");
        }
        if self.foreground_color.is_some() {
            fields.push("foregroundColor");
        }
        if self.background_color.is_some() {
            fields.push("backgroundColor");
        }
        if self.link.is_some() {
            fields.push("link");
        }
        fields
    }
}

/// A style applied to `start..end` of the owning text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub style: TextStyle,
}

impl StyleRun {
    /// Create a run
    pub fn new(start: usize, end: usize, style: TextStyle) -> Self {
        Self { start, end, style }
    }

    fn base(len: usize, size: f64) -> Self {
        Self::new(
            0,
            len,
            TextStyle {
                font_size: Some(FontSize::pt(size)),
                ..Default::default()
            },
        )
    }

    /// A base run spans the whole text and carries only a font size
    fn is_base_for(&self, len: usize) -> bool {
        self.start == 0
            && self.end == len
            && self.style.font_size.is_some()
            && TextStyle {
                font_size: None,
                ..self.style.clone()
            }
            .is_empty()
    }
}

/// Kind of list a marked range belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// A range of paragraphs that should receive list bullets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMarker {
    pub start: usize,
    pub end: usize,
    pub kind: ListKind,
}

/// Raw text with style runs and list ranges
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub raw_text: String,
    #[serde(default)]
    pub runs: Vec<StyleRun>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_markers: Vec<ListMarker>,
}

impl TextBlock {
    /// Create an unstyled block
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            raw_text: text.into(),
            ..Default::default()
        }
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        utf16_len(&self.raw_text)
    }

    /// True when the text is empty
    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }

    /// First family named by any run
    pub fn font_family(&self) -> Option<&str> {
        self.runs.iter().find_map(|r| r.style.font_family.as_deref())
    }

    fn base_run_size(&self) -> Option<f64> {
        let len = self.len();
        self.runs
            .first()
            .filter(|run| run.is_base_for(len))
            .and_then(|run| run.style.font_size)
            .map(|size| size.magnitude)
    }

    /// Largest font size in the block. The base run, when present, stands
    /// in for `base`.
    pub fn max_font_size(&self, base: f64) -> f64 {
        let has_base = self.base_run_size().is_some();
        let mut max = self.base_run_size().unwrap_or(base);
        for run in self.runs.iter().skip(usize::from(has_base)) {
            if let Some(size) = run.style.font_size {
                if size.magnitude > max {
                    max = size.magnitude;
                }
            }
        }
        max
    }

    /// Rescale every run so that the largest size becomes `target * scale`.
    ///
    /// Relative differences between runs are preserved. The base run is
    /// replaced rather than stacked, so applying twice equals applying once
    /// with the last target.
    pub fn apply_font_size(&mut self, target: f64, base: f64, scale: f64) {
        let current_max = self.max_font_size(base);
        if !(current_max > 0.0) || !target.is_finite() {
            return;
        }
        let ratio = target / current_max * scale;

        let existing_base = self.base_run_size();
        let effective_base = existing_base.unwrap_or(base);
        let skip = usize::from(existing_base.is_some());

        for run in self.runs.iter_mut().skip(skip) {
            let size = run
                .style
                .font_size
                .map(|s| s.magnitude)
                .unwrap_or(effective_base);
            run.style.font_size = Some(FontSize::pt(size * ratio));
        }

        let base_run = StyleRun::base(self.len(), effective_base * ratio);
        if existing_base.is_some() {
            self.runs[0] = base_run;
        } else {
            self.runs.insert(0, base_run);
        }
    }
}

/// Incremental builder for a [`TextBlock`].
///
/// Style scopes nest: each scope inherits the attributes of the enclosing one.
/// Runs are stored in the order their scopes were opened.
#[derive(Debug, Default)]
pub struct TextBuilder {
    raw_text: String,
    len: usize,
    runs: Vec<StyleRun>,
    open: Vec<usize>,
    list_markers: Vec<ListMarker>,
}

impl TextBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no text has been appended
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Text appended so far
    pub fn text(&self) -> &str {
        &self.raw_text
    }

    /// Effective style at the current position
    pub fn current_style(&self) -> TextStyle {
        self.open
            .last()
            .map(|&index| self.runs[index].style.clone())
            .unwrap_or_default()
    }

    /// Append literal text
    pub fn append_text(&mut self, text: &str) {
        self.raw_text.push_str(text);
        self.len += utf16_len(text);
    }

    /// Open a style scope
    pub fn start_style(&mut self, style: TextStyle) {
        let effective = style.merged_onto(&self.current_style());
        self.runs.push(StyleRun::new(self.len, self.len, effective));
        self.open.push(self.runs.len() - 1);
    }

    /// Close the innermost style scope
    pub fn end_style(&mut self) {
        if let Some(index) = self.open.pop() {
            self.runs[index].end = self.len;
        }
    }

    /// Number of open style scopes
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Mark `start..current` as list paragraphs
    pub fn mark_list(&mut self, start: usize, kind: ListKind) {
        if start < self.len {
            self.list_markers.push(ListMarker {
                start,
                end: self.len,
                kind,
            });
        }
    }

    /// Close any open scopes and produce the block
    pub fn finish(mut self) -> TextBlock {
        while !self.open.is_empty() {
            self.end_style();
        }
        self.runs
            .retain(|run| run.start < run.end && !run.style.is_empty());
        TextBlock {
            raw_text: self.raw_text,
            runs: self.runs,
            list_markers: self.list_markers,
        }
    }
}
