//! Deck configuration.
//!
//! `DeckConfig` is read from an `md2gs.toml` file. Every section and every
//! field has a default, so an empty file (or no file at all) is valid.
//!
//! ```toml
//! [fonts]
//! family = "Roboto"
//! monospace = "Roboto Mono"
//!
//! [[fonts.files]]
//! family = "Brand Sans"
//! path = "fonts/BrandSans-Regular.ttf"
//!
//! [autofit]
//! max_pt = 40.0
//! scale = 0.8
//!
//! [markdown]
//! emoji = false
//! ```

use std::path::{Path, PathBuf};

use md2gs_markdown::{Stylesheet, TokenizerOptions};
use md2gs_text::metrics::{DEFAULT_FALLBACK_FAMILY, SANS_FALLBACK_FAMILY};
use md2gs_text::{constants, AutoFit, FontRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlidesError};
use crate::slide::{PlaceholderRole, SlideLayout};

/// Configuration for compiling and rendering a deck
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeckConfig {
    /// Font families and font files
    #[serde(default)]
    pub fonts: FontConfig,

    /// Auto-fit bounds
    #[serde(default)]
    pub autofit: AutoFitConfig,

    /// Markdown extension toggles
    #[serde(default)]
    pub markdown: TokenizerOptions,

    /// Code highlighting theme
    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Page geometry and default placeholder boxes
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Font configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FontConfig {
    /// Family assumed for text without an explicit family
    #[serde(default = "default_family")]
    pub family: String,

    /// Family applied to inline code and code blocks
    #[serde(default = "default_monospace")]
    pub monospace: String,

    /// Fallback for unknown families
    #[serde(default = "default_fallback")]
    pub fallback: String,

    /// Fallback for unknown families that look sans-serif
    #[serde(default = "default_sans_fallback")]
    pub sans_fallback: String,

    /// Font files whose real glyph advances should be measured
    #[serde(default)]
    pub files: Vec<FontFile>,
}

fn default_family() -> String {
    "Arial".to_string()
}

fn default_monospace() -> String {
    "Courier New".to_string()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_FAMILY.to_string()
}

fn default_sans_fallback() -> String {
    SANS_FALLBACK_FAMILY.to_string()
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: default_family(),
            monospace: default_monospace(),
            fallback: default_fallback(),
            sans_fallback: default_sans_fallback(),
            files: Vec::new(),
        }
    }
}

/// A font file registered under a family name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FontFile {
    pub family: String,
    pub path: PathBuf,
}

/// Auto-fit bounds, in points
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoFitConfig {
    #[serde(default = "default_min_pt")]
    pub min_pt: f64,

    #[serde(default = "default_max_pt")]
    pub max_pt: f64,

    /// Size assumed for text that carries no explicit size
    #[serde(default = "default_base_pt")]
    pub base_pt: f64,

    /// Bisection stops once the interval is narrower than this
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Factor applied to every fitted size
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_min_pt() -> f64 {
    8.0
}
fn default_max_pt() -> f64 {
    48.0
}
fn default_base_pt() -> f64 {
    18.0
}
fn default_tolerance() -> f64 {
    0.5
}
fn default_scale() -> f64 {
    1.0
}

impl Default for AutoFitConfig {
    fn default() -> Self {
        Self {
            min_pt: default_min_pt(),
            max_pt: default_max_pt(),
            base_pt: default_base_pt(),
            tolerance: default_tolerance(),
            scale: default_scale(),
        }
    }
}

impl AutoFitConfig {
    /// The fitter described by this section
    pub fn fitter(&self) -> AutoFit {
        AutoFit {
            min_pt: self.min_pt,
            max_pt: self.max_pt,
            tolerance: self.tolerance,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HighlightConfig {
    /// CSS theme file; the bundled theme is used when unset
    #[serde(default)]
    pub theme: Option<PathBuf>,
}

/// Page size and placeholder boxes, in EMU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default = "default_page_width")]
    pub page_width_emu: f64,

    #[serde(default = "default_page_height")]
    pub page_height_emu: f64,

    /// Boxes used when the remote layout is unknown. Entries given in the
    /// file replace the built-in box for the same layout, role and index.
    #[serde(default)]
    pub boxes: Vec<PlaceholderBox>,
}

fn default_page_width() -> f64 {
    constants::DEFAULT_PAGE_WIDTH_EMU
}

fn default_page_height() -> f64 {
    constants::DEFAULT_PAGE_HEIGHT_EMU
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_emu: default_page_width(),
            page_height_emu: default_page_height(),
            boxes: Vec::new(),
        }
    }
}

/// A placeholder rectangle of a predefined layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlaceholderBox {
    pub layout: SlideLayout,
    pub role: PlaceholderRole,
    #[serde(default)]
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlaceholderBox {
    const fn new(
        layout: SlideLayout,
        role: PlaceholderRole,
        index: usize,
        rect: (f64, f64, f64, f64),
    ) -> Self {
        Self {
            layout,
            role,
            index,
            x: rect.0,
            y: rect.1,
            width: rect.2,
            height: rect.3,
        }
    }
}

/// Boxes of the stock 16:9 theme
const BUILTIN_BOXES: &[PlaceholderBox] = &[
    PlaceholderBox::new(SlideLayout::Title, PlaceholderRole::Title, 0, (311_700.0, 744_575.0, 8_520_600.0, 2_052_600.0)),
    PlaceholderBox::new(SlideLayout::Title, PlaceholderRole::Subtitle, 0, (311_700.0, 2_834_125.0, 8_520_600.0, 792_600.0)),
    PlaceholderBox::new(SlideLayout::SectionHeader, PlaceholderRole::Title, 0, (311_700.0, 2_150_850.0, 8_520_600.0, 841_800.0)),
    PlaceholderBox::new(SlideLayout::TitleAndBody, PlaceholderRole::Title, 0, (311_700.0, 445_025.0, 8_520_600.0, 572_700.0)),
    PlaceholderBox::new(SlideLayout::TitleAndBody, PlaceholderRole::Body, 0, (311_700.0, 1_152_475.0, 8_520_600.0, 3_416_400.0)),
    PlaceholderBox::new(SlideLayout::TitleAndTwoColumns, PlaceholderRole::Title, 0, (311_700.0, 445_025.0, 8_520_600.0, 572_700.0)),
    PlaceholderBox::new(SlideLayout::TitleAndTwoColumns, PlaceholderRole::Body, 0, (311_700.0, 1_152_475.0, 3_999_900.0, 3_416_400.0)),
    PlaceholderBox::new(SlideLayout::TitleAndTwoColumns, PlaceholderRole::Body, 1, (4_832_400.0, 1_152_475.0, 3_999_900.0, 3_416_400.0)),
    PlaceholderBox::new(SlideLayout::MainPoint, PlaceholderRole::Title, 0, (490_250.0, 450_150.0, 8_222_100.0, 3_733_500.0)),
    PlaceholderBox::new(SlideLayout::BigNumber, PlaceholderRole::Title, 0, (311_700.0, 1_106_125.0, 8_520_600.0, 1_963_500.0)),
    PlaceholderBox::new(SlideLayout::BigNumber, PlaceholderRole::Body, 0, (311_700.0, 3_152_225.0, 8_520_600.0, 1_300_800.0)),
];

impl LayoutConfig {
    /// Box for a placeholder of a predefined layout, configured or built-in
    pub fn placeholder_box(
        &self,
        layout: SlideLayout,
        role: PlaceholderRole,
        index: usize,
    ) -> Option<PlaceholderBox> {
        let matches = |b: &&PlaceholderBox| b.layout == layout && b.role == role && b.index == index;
        self.boxes
            .iter()
            .find(matches)
            .or_else(|| BUILTIN_BOXES.iter().find(matches))
            .copied()
    }

    /// Box covering the page inside a uniform margin
    pub fn page_box(&self, margin: f64) -> (f64, f64, f64, f64) {
        (
            margin,
            margin,
            (self.page_width_emu - 2.0 * margin).max(0.0),
            (self.page_height_emu - 2.0 * margin).max(0.0),
        )
    }
}

impl DeckConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeckConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let fit = &self.autofit;
        if !(fit.min_pt > 0.0 && fit.min_pt <= fit.max_pt) {
            return Err(SlidesError::invalid_config(format!(
                "autofit bounds must satisfy 0 < min_pt <= max_pt (got {} and {})",
                fit.min_pt, fit.max_pt
            )));
        }
        if fit.base_pt <= 0.0 || fit.scale <= 0.0 || fit.tolerance <= 0.0 {
            return Err(SlidesError::invalid_config(
                "autofit base_pt, scale and tolerance must be positive",
            ));
        }
        if self.markdown.tab_width == 0 {
            return Err(SlidesError::invalid_config("markdown.tab_width must be at least 1"));
        }
        if self.layout.page_width_emu <= 0.0 || self.layout.page_height_emu <= 0.0 {
            return Err(SlidesError::invalid_config("page size must be positive"));
        }
        Ok(())
    }

    /// Build a font registry with the configured fallbacks and font files.
    ///
    /// Relative font paths are resolved against `base_dir`.
    pub fn font_registry(&self, base_dir: Option<&Path>) -> Result<FontRegistry> {
        let registry =
            FontRegistry::with_fallbacks(self.fonts.fallback.clone(), self.fonts.sans_fallback.clone());
        for file in &self.fonts.files {
            let path = match base_dir {
                Some(dir) if file.path.is_relative() => dir.join(&file.path),
                _ => file.path.clone(),
            };
            let data = std::fs::read(&path)?;
            registry.register_font_data(&file.family, &data)?;
            debug!(family = %file.family, path = %path.display(), "Registered font file");
        }
        Ok(registry)
    }

    /// Load the highlight stylesheet, falling back to the bundled theme
    pub fn stylesheet(&self, base_dir: Option<&Path>) -> Result<Stylesheet> {
        match &self.highlight.theme {
            Some(theme) => {
                let path = match base_dir {
                    Some(dir) if theme.is_relative() => dir.join(theme),
                    _ => theme.clone(),
                };
                let css = std::fs::read_to_string(&path)?;
                Ok(Stylesheet::parse(&css))
            }
            None => Ok(Stylesheet::default_theme()),
        }
    }
}
