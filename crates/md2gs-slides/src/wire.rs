//! Wire types of the remote presentation API.
//!
//! Only the fields md2gs reads or writes are modelled. Unknown fields in
//! responses are ignored, absent optional fields are omitted from requests.

use md2gs_text::{RgbColor, TextStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Presentation snapshot
// ---------------------------------------------------------------------------

/// A presentation as returned by `get`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presentation {
    pub presentation_id: String,
    pub title: Option<String>,
    pub page_size: Option<Size>,
    pub slides: Vec<Page>,
    pub layouts: Vec<Page>,
}

/// A slide, layout or notes page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub object_id: String,
    pub page_elements: Vec<PageElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_properties: Option<SlideProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_properties: Option<LayoutProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_properties: Option<NotesProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlideProperties {
    pub layout_object_id: Option<String>,
    pub master_object_id: Option<String>,
    pub notes_page: Option<Box<Page>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutProperties {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub master_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesProperties {
    pub speaker_notes_object_id: Option<String>,
}

/// An element on a page. Exactly one of the kind fields is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageElement {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<AffineTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets_chart: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_art: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_group: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shape {
    pub shape_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub placeholder_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub text_elements: Vec<TextElement>,
}

impl TextContent {
    /// Concatenated content of every text run
    pub fn plain_text(&self) -> String {
        self.text_elements
            .iter()
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| r.content.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextElement {
    pub start_index: Option<u32>,
    pub end_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRun {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub content_url: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    pub url: Option<String>,
    pub source: Option<String>,
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default = "default_unit")]
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    #[default]
    Emu,
    Pt,
    #[serde(other)]
    Unspecified,
}

fn default_unit() -> Unit {
    Unit::Emu
}

impl Dimension {
    pub fn emu(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: Unit::Emu,
        }
    }

    /// Magnitude in EMU
    pub fn to_emu(&self) -> f64 {
        match self.unit {
            Unit::Pt => md2gs_text::points_to_emu(self.magnitude),
            Unit::Emu | Unit::Unspecified => self.magnitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub width: Dimension,
    pub height: Dimension,
}

impl Size {
    pub fn emu(width: f64, height: f64) -> Self {
        Self {
            width: Dimension::emu(width),
            height: Dimension::emu(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AffineTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub shear_x: f64,
    pub shear_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub unit: Unit,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            shear_x: 0.0,
            shear_y: 0.0,
            translate_x: 0.0,
            translate_y: 0.0,
            unit: Unit::Emu,
        }
    }
}

impl AffineTransform {
    /// Pure translation in EMU
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Default::default()
        }
    }
}

/// Rendered width and height of an element in EMU (size times scale)
pub fn rendered_size(size: Option<&Size>, transform: Option<&AffineTransform>) -> Option<(f64, f64)> {
    let size = size?;
    let (sx, sy) = transform.map_or((1.0, 1.0), |t| (t.scale_x, t.scale_y));
    Some((size.width.to_emu() * sx.abs(), size.height.to_emu() * sy.abs()))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One entry of a `batchUpdate` request list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    CreateSlide(CreateSlideRequest),
    InsertText(InsertTextRequest),
    DeleteText(DeleteTextRequest),
    UpdateTextStyle(UpdateTextStyleRequest),
    CreateParagraphBullets(CreateParagraphBulletsRequest),
    CreateImage(CreateImageRequest),
    CreateVideo(CreateVideoRequest),
    CreateTable(CreateTableRequest),
    UpdatePageProperties(UpdatePagePropertiesRequest),
    UpdateShapeProperties(UpdateShapePropertiesRequest),
    ReplaceImage(ReplaceImageRequest),
    DuplicateObject(DuplicateObjectRequest),
    DeleteObject(DeleteObjectRequest),
}

impl Request {
    /// API name of the request kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateSlide(_) => "createSlide",
            Self::InsertText(_) => "insertText",
            Self::DeleteText(_) => "deleteText",
            Self::UpdateTextStyle(_) => "updateTextStyle",
            Self::CreateParagraphBullets(_) => "createParagraphBullets",
            Self::CreateImage(_) => "createImage",
            Self::CreateVideo(_) => "createVideo",
            Self::CreateTable(_) => "createTable",
            Self::UpdatePageProperties(_) => "updatePageProperties",
            Self::UpdateShapeProperties(_) => "updateShapeProperties",
            Self::ReplaceImage(_) => "replaceImage",
            Self::DuplicateObject(_) => "duplicateObject",
            Self::DeleteObject(_) => "deleteObject",
        }
    }

    /// Insert `text` at the start of a shape
    pub fn insert_text(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::InsertText(InsertTextRequest {
            object_id: object_id.into(),
            cell_location: None,
            text: text.into(),
            insertion_index: Some(0),
        })
    }

    /// Delete every character of a shape
    pub fn delete_all_text(object_id: impl Into<String>) -> Self {
        Self::DeleteText(DeleteTextRequest {
            object_id: object_id.into(),
            cell_location: None,
            text_range: TextRange::all(),
        })
    }

    /// Shrink text on overflow
    pub fn text_autofit(object_id: impl Into<String>) -> Self {
        Self::UpdateShapeProperties(UpdateShapePropertiesRequest {
            object_id: object_id.into(),
            shape_properties: ShapeProperties {
                autofit: Autofit {
                    autofit_type: "TEXT_AUTOFIT".to_string(),
                },
            },
            fields: "autofit".to_string(),
        })
    }

    pub fn replace_image(image_object_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ReplaceImage(ReplaceImageRequest {
            image_object_id: image_object_id.into(),
            url: url.into(),
        })
    }

    pub fn duplicate_object(object_id: impl Into<String>) -> Self {
        Self::DuplicateObject(DuplicateObjectRequest {
            object_id: object_id.into(),
        })
    }

    pub fn delete_object(object_id: impl Into<String>) -> Self {
        Self::DeleteObject(DeleteObjectRequest {
            object_id: object_id.into(),
        })
    }

    /// Object the request targets
    pub fn object_id(&self) -> &str {
        match self {
            Self::CreateSlide(r) => &r.object_id,
            Self::InsertText(r) => &r.object_id,
            Self::DeleteText(r) => &r.object_id,
            Self::UpdateTextStyle(r) => &r.object_id,
            Self::CreateParagraphBullets(r) => &r.object_id,
            Self::CreateImage(r) => &r.object_id,
            Self::CreateVideo(r) => &r.object_id,
            Self::CreateTable(r) => &r.object_id,
            Self::UpdatePageProperties(r) => &r.object_id,
            Self::UpdateShapeProperties(r) => &r.object_id,
            Self::ReplaceImage(r) => &r.image_object_id,
            Self::DuplicateObject(r) => &r.object_id,
            Self::DeleteObject(r) => &r.object_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlideRequest {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insertion_index: Option<usize>,
    pub slide_layout_reference: LayoutReference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholder_id_mappings: Vec<LayoutPlaceholderIdMapping>,
}

/// Either a predefined layout name or the object id of a layout page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutReference {
    PredefinedLayout(String),
    LayoutId(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlaceholderIdMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_placeholder: Option<Placeholder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_placeholder_object_id: Option<String>,
    pub object_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub row_index: usize,
    pub column_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insertion_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTextRequest {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub text_range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeType {
    All,
    FixedRange,
    FromStartIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    #[serde(rename = "type")]
    pub range_type: RangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
}

impl TextRange {
    pub fn all() -> Self {
        Self {
            range_type: RangeType::All,
            start_index: None,
            end_index: None,
        }
    }

    pub fn fixed(start: usize, end: usize) -> Self {
        Self {
            range_type: RangeType::FixedRange,
            start_index: Some(start),
            end_index: Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyleRequest {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub style: WireTextStyle,
    pub text_range: TextRange,
    pub fields: String,
}

/// Text style in the nested shape the API expects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<OptionalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<OptionalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalColor {
    pub opaque_color: OpaqueColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueColor {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub url: String,
}

impl From<&TextStyle> for WireTextStyle {
    fn from(style: &TextStyle) -> Self {
        let color = |c: &Option<RgbColor>| {
            c.map(|rgb_color| OptionalColor {
                opaque_color: OpaqueColor { rgb_color },
            })
        };
        Self {
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            strikethrough: style.strikethrough,
            font_family: style.font_family.clone(),
            font_size: style.font_size.map(|s| Dimension {
                magnitude: s.magnitude,
                unit: Unit::Pt,
            }),
            foreground_color: color(&style.foreground_color),
            background_color: color(&style.background_color),
            link: style.link.clone().map(|url| Link { url }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParagraphBulletsRequest {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub text_range: TextRange,
    pub bullet_preset: String,
}

/// Where a new element goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElementProperties {
    pub page_object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<AffineTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    pub object_id: String,
    pub url: String,
    pub element_properties: PageElementProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub object_id: String,
    pub source: String,
    pub id: String,
    pub element_properties: PageElementProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub object_id: String,
    pub element_properties: PageElementProperties,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePagePropertiesRequest {
    pub object_id: String,
    pub page_properties: PageProperties,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProperties {
    pub page_background_fill: PageBackgroundFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBackgroundFill {
    pub stretched_picture_fill: StretchedPictureFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StretchedPictureFill {
    pub content_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShapePropertiesRequest {
    pub object_id: String,
    pub shape_properties: ShapeProperties,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProperties {
    pub autofit: Autofit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autofit {
    pub autofit_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceImageRequest {
    pub image_object_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateObjectRequest {
    pub object_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObjectRequest {
    pub object_id: String,
}

/// Body of a `batchUpdate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of a `batchUpdate` call; one reply per request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchUpdateResponse {
    pub presentation_id: Option<String>,
    pub replies: Vec<Response>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_object: Option<ObjectReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_slide: Option<ObjectReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_image: Option<ObjectReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_video: Option<ObjectReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_table: Option<ObjectReply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReply {
    pub object_id: Option<String>,
}

impl BatchUpdateResponse {
    /// Reply to a `duplicateObject` at position `index`
    pub fn duplicated_object_id(&self, index: usize) -> Option<&str> {
        self.replies
            .get(index)?
            .duplicate_object
            .as_ref()?
            .object_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}
