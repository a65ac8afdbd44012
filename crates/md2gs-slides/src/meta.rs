//! Presentation metadata.
//!
//! Flat projections of a [`Presentation`] snapshot: layouts with their
//! placeholders, and slides with their elements and position markers.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::wire::{rendered_size, AffineTransform, Page, PageElement, Presentation, Size};

/// Prefix of the hidden position marker in speaker notes
pub const MARKER_PREFIX: &str = "md2gs-slide:";

static MARKER: OnceLock<Regex> = OnceLock::new();

/// Marker text for the slide at `index`
pub fn marker_text(index: usize) -> String {
    format!("{MARKER_PREFIX}{index}\n")
}

/// Marker found in speaker notes text.
///
/// `Some(None)` means a marker prefix is present but carries no index.
pub fn parse_marker(text: &str) -> Option<Option<usize>> {
    let marker = MARKER.get_or_init(|| Regex::new(r"^md2gs-slide:(\d*)").unwrap());
    let caps = marker.captures(text)?;
    Some(caps[1].parse().ok())
}

/// Alignment of a slide's marker with its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// No marker in the notes
    Unmarked,
    /// Marker equals the slide's position
    Marked,
    /// Marker differs from the slide's position, or is unreadable
    Stale,
}

/// Kind of a page element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Shape,
    Image,
    Video,
    Table,
    Line,
    SheetsChart,
    WordArt,
    Group,
    Unknown,
}

impl ElementType {
    pub fn of(element: &PageElement) -> Self {
        if element.shape.is_some() {
            Self::Shape
        } else if element.image.is_some() {
            Self::Image
        } else if element.video.is_some() {
            Self::Video
        } else if element.table.is_some() {
            Self::Table
        } else if element.line.is_some() {
            Self::Line
        } else if element.sheets_chart.is_some() {
            Self::SheetsChart
        } else if element.word_art.is_some() {
            Self::WordArt
        } else if element.element_group.is_some() {
            Self::Group
        } else {
            Self::Unknown
        }
    }
}

/// A placeholder shape on a layout or slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderMeta {
    pub object_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub placeholder_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<AffineTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl PlaceholderMeta {
    /// Rendered `(x, y, width, height)` in EMU, when the size is known
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let (width, height) = rendered_size(self.size.as_ref(), self.transform.as_ref())?;
        let (x, y) = self
            .transform
            .map_or((0.0, 0.0), |t| (t.translate_x, t.translate_y));
        Some((x, y, width, height))
    }
}

/// Any element on a slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementMeta {
    pub object_id: String,
    pub element_type: ElementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<AffineTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// A layout page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMeta {
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub placeholders: Vec<PlaceholderMeta>,
}

impl LayoutMeta {
    /// True when `name` equals the layout's name or display name, ignoring case
    pub fn is_named(&self, name: &str) -> bool {
        [self.name.as_deref(), self.display_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|n| n.eq_ignore_ascii_case(name.trim()))
    }

    /// The `nth` placeholder whose type satisfies `accepts`
    pub fn placeholder(&self, accepts: impl Fn(&str) -> bool, nth: usize) -> Option<&PlaceholderMeta> {
        self.placeholders
            .iter()
            .filter(|p| p.placeholder_type.as_deref().is_some_and(&accepts))
            .nth(nth)
    }
}

/// A slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideMeta {
    pub object_id: String,
    /// Display name of the slide's layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Marker value for marked slides, otherwise the position
    pub index: usize,
    /// Position in the presentation (0-based)
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<usize>,
    pub marker_state: MarkerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_object_id: Option<String>,
    pub placeholders: Vec<PlaceholderMeta>,
    pub elements: Vec<ElementMeta>,
}

/// Snapshot of a presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationMeta {
    pub presentation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<Size>,
    pub layouts: Vec<LayoutMeta>,
    pub slides: Vec<SlideMeta>,
}

impl PresentationMeta {
    /// Project a snapshot. `presentation_id` is used when the snapshot
    /// does not carry its own id.
    pub fn from_presentation(presentation: &Presentation, presentation_id: &str) -> Self {
        let layouts: Vec<LayoutMeta> = presentation.layouts.iter().map(layout_meta).collect();
        let slides = presentation
            .slides
            .iter()
            .enumerate()
            .map(|(position, page)| slide_meta(page, position, &layouts))
            .collect();

        let id = if presentation.presentation_id.is_empty() {
            presentation_id.to_string()
        } else {
            presentation.presentation_id.clone()
        };

        Self {
            presentation_id: id,
            title: presentation.title.clone(),
            page_size: presentation.page_size,
            layouts,
            slides,
        }
    }

    /// Layout with the given name or display name
    pub fn layout_named(&self, name: &str) -> Option<&LayoutMeta> {
        self.layouts.iter().find(|l| l.is_named(name))
    }

    /// Slide whose index (marker value or position) equals `index`
    pub fn slide_at(&self, index: usize) -> Option<&SlideMeta> {
        self.slides.iter().find(|s| s.index == index)
    }

    /// Slides whose marker disagrees with their position
    pub fn stale_slides(&self) -> impl Iterator<Item = &SlideMeta> {
        self.slides
            .iter()
            .filter(|s| s.marker_state == MarkerState::Stale)
    }
}

fn trimmed(text: String) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn element_text(element: &PageElement) -> Option<String> {
    let text = element.shape.as_ref()?.text.as_ref()?;
    trimmed(text.plain_text())
}

fn placeholder_meta(element: &PageElement) -> Option<PlaceholderMeta> {
    let placeholder = element.shape.as_ref()?.placeholder.as_ref()?;
    Some(PlaceholderMeta {
        object_id: element.object_id.clone(),
        placeholder_type: placeholder.placeholder_type.clone(),
        index: placeholder.index,
        text: element_text(element),
        transform: element.transform,
        size: element.size,
    })
}

fn element_meta(element: &PageElement) -> ElementMeta {
    let placeholder_type = element
        .shape
        .as_ref()
        .and_then(|s| s.placeholder.as_ref())
        .or_else(|| element.image.as_ref().and_then(|i| i.placeholder.as_ref()))
        .and_then(|p| p.placeholder_type.clone());
    let image_url = element
        .image
        .as_ref()
        .and_then(|i| i.source_url.clone().or_else(|| i.content_url.clone()));

    ElementMeta {
        object_id: element.object_id.clone(),
        element_type: ElementType::of(element),
        placeholder_type,
        text: element_text(element),
        image_url,
        video_url: element.video.as_ref().and_then(|v| v.url.clone()),
        transform: element.transform,
        size: element.size,
    }
}

fn layout_meta(page: &Page) -> LayoutMeta {
    let properties = page.layout_properties.as_ref();
    LayoutMeta {
        object_id: page.object_id.clone(),
        name: properties.and_then(|p| p.name.clone()),
        display_name: properties.and_then(|p| p.display_name.clone()),
        placeholders: page.page_elements.iter().filter_map(placeholder_meta).collect(),
    }
}

/// Speaker notes shape of a slide
pub fn notes_object_id(page: &Page) -> Option<&str> {
    page.slide_properties
        .as_ref()?
        .notes_page
        .as_ref()?
        .notes_properties
        .as_ref()?
        .speaker_notes_object_id
        .as_deref()
}

/// Marker carried by any text run of the slide's notes page
pub fn find_marker(page: &Page) -> Option<Option<usize>> {
    let notes = page.slide_properties.as_ref()?.notes_page.as_ref()?;
    notes
        .page_elements
        .iter()
        .filter_map(|e| e.shape.as_ref()?.text.as_ref())
        .flat_map(|t| t.text_elements.iter())
        .filter_map(|e| e.text_run.as_ref())
        .find_map(|run| parse_marker(&run.content))
}

fn slide_meta(page: &Page, position: usize, layouts: &[LayoutMeta]) -> SlideMeta {
    let marker = find_marker(page);
    let (value, state) = match marker {
        None => (None, MarkerState::Unmarked),
        Some(Some(value)) if value == position => (Some(value), MarkerState::Marked),
        Some(value) => {
            warn!(
                slide = %page.object_id,
                position,
                marker = ?value,
                "Slide marker does not match its position"
            );
            (value, MarkerState::Stale)
        }
    };

    let layout = page
        .slide_properties
        .as_ref()
        .and_then(|p| p.layout_object_id.as_deref())
        .and_then(|id| layouts.iter().find(|l| l.object_id == id))
        .and_then(|l| l.display_name.clone());

    let placeholders: Vec<PlaceholderMeta> =
        page.page_elements.iter().filter_map(placeholder_meta).collect();
    let title = placeholders
        .iter()
        .find(|p| matches!(p.placeholder_type.as_deref(), Some("TITLE" | "CENTERED_TITLE")))
        .and_then(|p| p.text.clone());

    SlideMeta {
        object_id: page.object_id.clone(),
        layout,
        title,
        index: value.unwrap_or(position),
        position,
        marker: value,
        marker_state: state,
        notes_object_id: notes_object_id(page).map(str::to_string),
        placeholders,
        elements: page.page_elements.iter().map(element_meta).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presentation() -> Presentation {
        serde_json::from_value(json!({
            "presentationId": "deck1",
            "title": "Quarterly",
            "layouts": [{
                "objectId": "l1",
                "layoutProperties": {"name": "TITLE_AND_BODY", "displayName": "Title and body"},
                "pageElements": [
                    {"objectId": "l1_t", "shape": {"placeholder": {"type": "TITLE"}},
                     "size": {"width": {"magnitude": 1000, "unit": "EMU"}, "height": {"magnitude": 200, "unit": "EMU"}},
                     "transform": {"scaleX": 2, "scaleY": 1, "translateX": 10, "translateY": 20, "unit": "EMU"}},
                    {"objectId": "l1_b", "shape": {"placeholder": {"type": "BODY", "index": 1}}},
                    {"objectId": "l1_deco", "shape": {"shapeType": "RECTANGLE"}}
                ]
            }],
            "slides": [
                {
                    "objectId": "s1",
                    "slideProperties": {
                        "layoutObjectId": "l1",
                        "notesPage": {
                            "objectId": "n1",
                            "notesProperties": {"speakerNotesObjectId": "n1_body"},
                            "pageElements": [{"objectId": "n1_body", "shape": {"text": {"textElements": [
                                {"textRun": {"content": "md2gs-slide:0\n"}}
                            ]}}}]
                        }
                    },
                    "pageElements": [
                        {"objectId": "s1_t", "shape": {"placeholder": {"type": "TITLE"}, "text": {"textElements": [
                            {"textRun": {"content": "  Results \n"}}
                        ]}}},
                        {"objectId": "s1_img", "image": {"contentUrl": "https://c/1", "sourceUrl": "https://s/1"}},
                        {"objectId": "s1_vid", "video": {"url": "https://youtu.be/x", "source": "YOUTUBE", "id": "x"}},
                        {"objectId": "s1_line", "line": {}}
                    ]
                },
                {
                    "objectId": "s2",
                    "slideProperties": {
                        "notesPage": {
                            "notesProperties": {"speakerNotesObjectId": "n2_body"},
                            "pageElements": [{"objectId": "n2_body", "shape": {"text": {"textElements": [
                                {"textRun": {"content": "md2gs-slide:7\n"}},
                                {"textRun": {"content": "Say hello\n"}}
                            ]}}}]
                        }
                    }
                },
                {"objectId": "s3"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_marker("md2gs-slide:12\n"), Some(Some(12)));
        assert_eq!(parse_marker("md2gs-slide:\n"), Some(None));
        assert_eq!(parse_marker("notes md2gs-slide:1"), None);
        assert_eq!(marker_text(3), "md2gs-slide:3\n");
    }

    #[test]
    fn test_layout_projection() {
        let meta = PresentationMeta::from_presentation(&presentation(), "ignored");
        assert_eq!(meta.presentation_id, "deck1");
        assert_eq!(meta.title.as_deref(), Some("Quarterly"));

        let layout = meta.layout_named("title and BODY").unwrap();
        assert_eq!(layout.placeholders.len(), 2);
        let title = layout.placeholder(|t| t == "TITLE", 0).unwrap();
        assert_eq!(title.bounds(), Some((10.0, 20.0, 2000.0, 200.0)));
        assert_eq!(layout.placeholder(|t| t == "BODY", 0).unwrap().index, Some(1));
        assert!(layout.placeholder(|t| t == "BODY", 1).is_none());
        assert!(meta.layout_named("TITLE_AND_BODY").is_some());
    }

    #[test]
    fn test_slide_projection() {
        let meta = PresentationMeta::from_presentation(&presentation(), "deck1");
        let first = &meta.slides[0];
        assert_eq!(first.layout.as_deref(), Some("Title and body"));
        assert_eq!(first.title.as_deref(), Some("Results"));
        assert_eq!(first.marker_state, MarkerState::Marked);
        assert_eq!(first.notes_object_id.as_deref(), Some("n1_body"));

        let types: Vec<ElementType> = first.elements.iter().map(|e| e.element_type).collect();
        assert_eq!(
            types,
            vec![ElementType::Shape, ElementType::Image, ElementType::Video, ElementType::Line]
        );
        assert_eq!(first.elements[0].placeholder_type.as_deref(), Some("TITLE"));
        assert_eq!(first.elements[1].image_url.as_deref(), Some("https://s/1"));
        assert_eq!(first.elements[2].video_url.as_deref(), Some("https://youtu.be/x"));
    }

    #[test]
    fn test_marker_states() {
        let meta = PresentationMeta::from_presentation(&presentation(), "deck1");

        let stale = &meta.slides[1];
        assert_eq!(stale.marker_state, MarkerState::Stale);
        assert_eq!(stale.index, 7);
        assert_eq!(stale.position, 1);

        let unmarked = &meta.slides[2];
        assert_eq!(unmarked.marker_state, MarkerState::Unmarked);
        assert_eq!(unmarked.index, 2);
        assert!(unmarked.notes_object_id.is_none());

        assert_eq!(meta.stale_slides().count(), 1);
        assert_eq!(meta.slide_at(7).map(|s| s.object_id.as_str()), Some("s2"));
    }
}
