//! Slide definitions.
//!
//! The intermediate representation produced by the deck compiler and
//! consumed by request rendering. Text is held as [`TextBlock`]s so that
//! styling survives until the requests are built.

use md2gs_markdown::VideoService;
use md2gs_text::TextBlock;
use serde::{Deserialize, Serialize};

/// Predefined layouts of the remote presentation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlideLayout {
    /// Centered title and subtitle
    Title,

    /// Section divider with a single title
    SectionHeader,

    /// Title above one body
    #[default]
    TitleAndBody,

    /// Title above two side-by-side bodies
    TitleAndTwoColumns,

    /// One large statement
    MainPoint,

    /// Large figure with a caption body
    BigNumber,

    /// No placeholders
    Blank,
}

impl SlideLayout {
    pub const ALL: [SlideLayout; 7] = [
        SlideLayout::Title,
        SlideLayout::SectionHeader,
        SlideLayout::TitleAndBody,
        SlideLayout::TitleAndTwoColumns,
        SlideLayout::MainPoint,
        SlideLayout::BigNumber,
        SlideLayout::Blank,
    ];

    /// Name understood by `predefinedLayout`
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::SectionHeader => "SECTION_HEADER",
            Self::TitleAndBody => "TITLE_AND_BODY",
            Self::TitleAndTwoColumns => "TITLE_AND_TWO_COLUMNS",
            Self::MainPoint => "MAIN_POINT",
            Self::BigNumber => "BIG_NUMBER",
            Self::Blank => "BLANK",
        }
    }

    /// Parse a predefined layout name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().replace([' ', '-'], "_").to_ascii_uppercase();
        Self::ALL.into_iter().find(|l| l.api_name() == name)
    }

    /// Placeholder type of the title placeholder, if the layout has one
    pub fn title_placeholder_type(&self) -> Option<&'static str> {
        match self {
            Self::Title => Some("CENTERED_TITLE"),
            Self::Blank => None,
            _ => Some("TITLE"),
        }
    }

    pub fn has_subtitle(&self) -> bool {
        matches!(self, Self::Title)
    }

    /// Number of body placeholders
    pub fn body_count(&self) -> usize {
        match self {
            Self::TitleAndBody | Self::BigNumber => 1,
            Self::TitleAndTwoColumns => 2,
            _ => 0,
        }
    }
}

/// Role of a text placeholder on a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderRole {
    Title,
    Subtitle,
    Body,
}

impl PlaceholderRole {
    /// Remote placeholder type for this role on `layout`
    pub fn placeholder_type(&self, layout: SlideLayout) -> &'static str {
        match self {
            Self::Title => layout.title_placeholder_type().unwrap_or("TITLE"),
            Self::Subtitle => "SUBTITLE",
            Self::Body => "BODY",
        }
    }

    /// True when a remote placeholder type can hold this role
    pub fn accepts(&self, placeholder_type: &str) -> bool {
        match self {
            Self::Title => matches!(placeholder_type, "TITLE" | "CENTERED_TITLE"),
            Self::Subtitle => placeholder_type == "SUBTITLE",
            Self::Body => placeholder_type == "BODY",
        }
    }
}

/// An image placed on a slide or used as its background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDefinition {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Requested size in EMU, from `width=`/`height=` attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ImageDefinition {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: String::new(),
            title: None,
            width: None,
            height: None,
        }
    }

    /// True when the remote service can fetch the image itself
    pub fn is_remote(&self) -> bool {
        is_remote_url(&self.url)
    }
}

/// True for `http://` and `https://` URLs
pub fn is_remote_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// An embedded video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDefinition {
    pub service: VideoService,
    pub id: String,
}

/// A `$`-fenced block whose image is produced by an external renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageDefinition {
    pub params: String,
    pub source: String,
}

/// A table with styled cell text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub rows: usize,
    pub columns: usize,
    /// Cells in row-major order; short rows are padded with empty blocks
    pub cells: Vec<Vec<TextBlock>>,
}

impl TableDefinition {
    /// Build a table from ragged rows
    pub fn from_rows(mut rows: Vec<Vec<TextBlock>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize_with(columns, TextBlock::default);
        }
        Self {
            rows: rows.len(),
            columns,
            cells: rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }
}

/// Content of one body placeholder (one column)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<VideoDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_images: Vec<GeneratedImageDefinition>,
}

impl BodyDefinition {
    pub fn is_empty(&self) -> bool {
        self.text.as_ref().map_or(true, TextBlock::is_empty) && !self.has_media()
    }

    /// True when the body carries anything besides text
    pub fn has_media(&self) -> bool {
        !self.images.is_empty()
            || !self.videos.is_empty()
            || !self.tables.is_empty()
            || !self.generated_images.is_empty()
    }
}

/// A single slide
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDefinition {
    /// Position in the deck (0-based)
    pub index: usize,

    /// Object id requested with `{#id}` on the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Layout chosen by the compiler
    pub layout: SlideLayout,

    /// Layout requested by name that is not predefined; resolved against
    /// the remote presentation's layouts when rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_layout: Option<String>,

    /// Title marked `{.big}`
    #[serde(default)]
    pub big: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TextBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<TextBlock>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<BodyDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<ImageDefinition>,

    /// Speaker notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SlideDefinition {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// True when nothing would be drawn and there are no notes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.bodies.iter().all(BodyDefinition::is_empty)
            && self.background_image.is_none()
            && self.notes.is_none()
    }

    /// Bodies that carry content
    pub fn content_bodies(&self) -> impl Iterator<Item = &BodyDefinition> {
        self.bodies.iter().filter(|b| !b.is_empty())
    }

    /// Plain title text, for logging and summaries
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().map(|t| t.raw_text.as_str())
    }

    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }
}

/// A compiled deck
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<SlideDefinition>,
}

impl Deck {
    /// Create a new empty deck
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide, renumbering it to its position
    pub fn push(&mut self, mut slide: SlideDefinition) {
        slide.index = self.slides.len();
        self.slides.push(slide);
    }

    /// Get the number of slides
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Check if the deck is empty
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
