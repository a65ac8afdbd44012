//! Request rendering.
//!
//! Turns [`SlideDefinition`]s into batch update requests: one `createSlide`
//! with placeholder id mappings, then text, media and background requests
//! targeting the mapped object ids.

use md2gs_markdown::VideoService;
use md2gs_text::{ListKind, TextBlock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::DeckConfig;
use crate::error::{Result, SlidesError};
use crate::layout::{LayoutResolver, Rect};
use crate::meta::{LayoutMeta, PresentationMeta};
use crate::slide::{
    Deck, ImageDefinition, PlaceholderRole, SlideDefinition, TableDefinition, VideoDefinition,
};
use crate::wire::{
    AffineTransform, CreateImageRequest, CreateParagraphBulletsRequest, CreateSlideRequest,
    CreateTableRequest, CreateVideoRequest, InsertTextRequest, LayoutPlaceholderIdMapping,
    LayoutReference, PageBackgroundFill, PageElementProperties, PageProperties, Placeholder,
    Request, Size, StretchedPictureFill, TableCellLocation, TextRange, UpdatePagePropertiesRequest,
    UpdateTextStyleRequest,
};

/// Horizontal gap between media items sharing a body area, in EMU
pub const MEDIA_GAP_EMU: f64 = 127_000.0;

const BULLET_PRESET: &str = "BULLET_DISC_CIRCLE_SQUARE";
const NUMBERED_PRESET: &str = "NUMBERED_DIGIT_ALPHA_ROMAN";
const BACKGROUND_FIELDS: &str = "pageBackgroundFill.stretchedPictureFill.contentUrl";

/// Generator for object ids unique to one rendering session
#[derive(Debug, Clone)]
pub struct ObjectIds {
    prefix: String,
    counter: usize,
}

impl ObjectIds {
    pub fn new() -> Self {
        let session = Uuid::new_v4().simple().to_string();
        Self::with_prefix(format!("md2gs_{}", &session[..12]))
    }

    /// Deterministic ids, for tests and dry runs
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Next id, e.g. `md2gs_0123456789ab_title3`
    pub fn next(&mut self, kind: &str) -> String {
        self.counter += 1;
        format!("{}_{}{}", self.prefix, kind, self.counter)
    }
}

impl Default for ObjectIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests for one slide
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub object_id: String,
    pub requests: Vec<Request>,
}

/// Renders slides against a configuration and, optionally, a presentation
/// snapshot providing custom layouts and placeholder geometry
#[derive(Debug)]
pub struct SlideRenderer<'a> {
    config: &'a DeckConfig,
    meta: Option<&'a PresentationMeta>,
    ids: ObjectIds,
}

impl<'a> SlideRenderer<'a> {
    pub fn new(config: &'a DeckConfig, meta: Option<&'a PresentationMeta>) -> Self {
        Self::with_ids(config, meta, ObjectIds::new())
    }

    pub fn with_ids(config: &'a DeckConfig, meta: Option<&'a PresentationMeta>, ids: ObjectIds) -> Self {
        Self { config, meta, ids }
    }

    /// Render every slide, inserting the first at `insertion_index`
    pub fn render_deck(&mut self, deck: &Deck, insertion_index: usize) -> Result<Vec<RenderedSlide>> {
        deck.slides
            .iter()
            .enumerate()
            .map(|(offset, slide)| self.render_slide(slide, insertion_index + offset))
            .collect()
    }

    /// Render one slide at `insertion_index`
    pub fn render_slide(&mut self, slide: &SlideDefinition, insertion_index: usize) -> Result<RenderedSlide> {
        let config = self.config;
        let resolver = LayoutResolver::new(&config.layout, self.meta);
        let object_id = slide
            .object_id
            .clone()
            .unwrap_or_else(|| self.ids.next("slide"));

        let custom = match &slide.custom_layout {
            Some(name) => Some(
                self.meta
                    .and_then(|m| m.layout_named(name))
                    .ok_or_else(|| SlidesError::unknown_layout(name, slide.index))?,
            ),
            None => None,
        };
        let layout_reference = match custom {
            Some(layout) => LayoutReference::LayoutId(layout.object_id.clone()),
            None => LayoutReference::PredefinedLayout(slide.layout.api_name().to_string()),
        };

        let mut mappings = Vec::new();
        let mut text_requests = Vec::new();

        let mut texts: Vec<(PlaceholderRole, usize, &TextBlock)> = Vec::new();
        if let Some(title) = &slide.title {
            texts.push((PlaceholderRole::Title, 0, title));
        }
        if let Some(subtitle) = &slide.subtitle {
            texts.push((PlaceholderRole::Subtitle, 0, subtitle));
        }
        for (index, body) in slide.bodies.iter().enumerate() {
            if let Some(text) = &body.text {
                texts.push((PlaceholderRole::Body, index, text));
            }
        }

        for (role, index, block) in texts {
            if block.is_empty() {
                continue;
            }
            if index >= resolver.capacity(slide, role) {
                warn!(
                    slide = slide.index,
                    role = ?role,
                    index,
                    "Layout has no placeholder for text, skipping"
                );
                continue;
            }
            let Some(mapping) = self.placeholder_mapping(slide, custom, role, index) else {
                warn!(slide = slide.index, role = ?role, index, "Placeholder not found, skipping");
                continue;
            };
            text_requests.extend(text_block_requests(&mapping.object_id, None, block));
            mappings.push(mapping);
        }

        let mut requests = vec![Request::CreateSlide(CreateSlideRequest {
            object_id: object_id.clone(),
            insertion_index: Some(insertion_index),
            slide_layout_reference: layout_reference,
            placeholder_id_mappings: mappings,
        })];
        requests.extend(text_requests);
        self.media_requests(slide, &object_id, &resolver, &mut requests);

        if let Some(background) = &slide.background_image {
            if background.is_remote() {
                requests.push(background_request(&object_id, &background.url));
            } else {
                warn!(slide = slide.index, url = %background.url, "Background image is not a remote URL, skipping");
            }
        }

        debug!(
            slide = slide.index,
            object_id = %object_id,
            requests = requests.len(),
            "Rendered slide"
        );
        Ok(RenderedSlide { object_id, requests })
    }

    fn placeholder_mapping(
        &mut self,
        slide: &SlideDefinition,
        custom: Option<&LayoutMeta>,
        role: PlaceholderRole,
        index: usize,
    ) -> Option<LayoutPlaceholderIdMapping> {
        let kind = match role {
            PlaceholderRole::Title => "title",
            PlaceholderRole::Subtitle => "subtitle",
            PlaceholderRole::Body => "body",
        };
        match custom {
            Some(layout) => {
                let placeholder = layout.placeholder(|t| role.accepts(t), index)?;
                Some(LayoutPlaceholderIdMapping {
                    layout_placeholder: None,
                    layout_placeholder_object_id: Some(placeholder.object_id.clone()),
                    object_id: self.ids.next(kind),
                })
            }
            None => Some(LayoutPlaceholderIdMapping {
                layout_placeholder: Some(Placeholder {
                    placeholder_type: Some(role.placeholder_type(slide.layout).to_string()),
                    index: Some(index as u32),
                    parent_object_id: None,
                }),
                layout_placeholder_object_id: None,
                object_id: self.ids.next(kind),
            }),
        }
    }

    fn media_requests(
        &mut self,
        slide: &SlideDefinition,
        page_id: &str,
        resolver: &LayoutResolver<'_>,
        requests: &mut Vec<Request>,
    ) {
        for (index, body) in slide.bodies.iter().enumerate() {
            let mut items: Vec<Media<'_>> = Vec::new();
            for image in &body.images {
                if image.is_remote() {
                    items.push(Media::Image(image));
                } else {
                    warn!(slide = slide.index, url = %image.url, "Image is not a remote URL, skipping");
                }
            }
            for video in &body.videos {
                if video.service == VideoService::Youtube {
                    items.push(Media::Video(video));
                } else {
                    warn!(slide = slide.index, service = video.service.as_str(), "Unsupported video service, skipping");
                }
            }
            items.extend(body.tables.iter().map(Media::Table));
            for generated in &body.generated_images {
                warn!(slide = slide.index, params = %generated.params, "Generated images need an upload, skipping");
            }

            if items.is_empty() {
                continue;
            }
            let slots = resolver.media_area(slide, index).columns(items.len(), MEDIA_GAP_EMU);
            for (item, slot) in items.into_iter().zip(slots) {
                match item {
                    Media::Image(image) => requests.push(self.image_request(page_id, image, slot)),
                    Media::Video(video) => requests.push(Request::CreateVideo(CreateVideoRequest {
                        object_id: self.ids.next("video"),
                        source: "YOUTUBE".to_string(),
                        id: video.id.clone(),
                        element_properties: element_properties(page_id, slot.width, slot.height, slot),
                    })),
                    Media::Table(table) => self.table_requests(page_id, table, slot, requests),
                }
            }
        }
    }

    fn image_request(&mut self, page_id: &str, image: &ImageDefinition, slot: Rect) -> Request {
        let width = image.width.map_or(slot.width, |w| w.min(slot.width));
        let height = image.height.map_or(slot.height, |h| h.min(slot.height));
        Request::CreateImage(CreateImageRequest {
            object_id: self.ids.next("image"),
            url: image.url.clone(),
            element_properties: element_properties(page_id, width, height, slot),
        })
    }

    fn table_requests(&mut self, page_id: &str, table: &TableDefinition, slot: Rect, requests: &mut Vec<Request>) {
        let object_id = self.ids.next("table");
        requests.push(Request::CreateTable(CreateTableRequest {
            object_id: object_id.clone(),
            element_properties: element_properties(page_id, slot.width, slot.height, slot),
            rows: table.rows,
            columns: table.columns,
        }));
        for (row_index, row) in table.cells.iter().enumerate() {
            for (column_index, cell) in row.iter().enumerate() {
                let location = TableCellLocation {
                    row_index,
                    column_index,
                };
                requests.extend(text_block_requests(&object_id, Some(location), cell));
            }
        }
    }
}

enum Media<'b> {
    Image(&'b ImageDefinition),
    Video(&'b VideoDefinition),
    Table(&'b TableDefinition),
}

fn element_properties(page_id: &str, width: f64, height: f64, slot: Rect) -> PageElementProperties {
    PageElementProperties {
        page_object_id: page_id.to_string(),
        size: Some(Size::emu(width, height)),
        transform: Some(AffineTransform::translate(slot.x, slot.y)),
    }
}

/// Insert a block's text and apply its runs and list ranges.
///
/// Bullets come last and in reverse order: creating them removes leading
/// tabs, which shifts every later index.
pub fn text_block_requests(
    object_id: &str,
    cell_location: Option<TableCellLocation>,
    block: &TextBlock,
) -> Vec<Request> {
    if block.is_empty() {
        return Vec::new();
    }
    let mut requests = vec![Request::InsertText(InsertTextRequest {
        object_id: object_id.to_string(),
        cell_location,
        text: block.raw_text.clone(),
        insertion_index: Some(0),
    })];

    for run in &block.runs {
        if run.start >= run.end || run.style.is_empty() {
            continue;
        }
        requests.push(Request::UpdateTextStyle(UpdateTextStyleRequest {
            object_id: object_id.to_string(),
            cell_location,
            style: (&run.style).into(),
            text_range: TextRange::fixed(run.start, run.end),
            fields: run.style.field_names().join(","),
        }));
    }

    let mut markers: Vec<_> = block.list_markers.iter().collect();
    markers.sort_by(|a, b| b.start.cmp(&a.start));
    for marker in markers {
        let bullet_preset = match marker.kind {
            ListKind::Bulleted => BULLET_PRESET,
            ListKind::Numbered => NUMBERED_PRESET,
        };
        requests.push(Request::CreateParagraphBullets(CreateParagraphBulletsRequest {
            object_id: object_id.to_string(),
            cell_location,
            text_range: TextRange::fixed(marker.start, marker.end),
            bullet_preset: bullet_preset.to_string(),
        }));
    }

    requests
}

fn background_request(page_id: &str, url: &str) -> Request {
    Request::UpdatePageProperties(UpdatePagePropertiesRequest {
        object_id: page_id.to_string(),
        page_properties: PageProperties {
            page_background_fill: PageBackgroundFill {
                stretched_picture_fill: StretchedPictureFill {
                    content_url: url.to_string(),
                },
            },
        },
        fields: BACKGROUND_FIELDS.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::{BodyDefinition, SlideLayout};
    use crate::wire::Presentation;
    use md2gs_text::{ListMarker, StyleRun, TextStyle};
    use serde_json::json;

    fn renderer(config: &DeckConfig) -> SlideRenderer<'_> {
        SlideRenderer::with_ids(config, None, ObjectIds::with_prefix("t"))
    }

    fn kinds(requests: &[Request]) -> Vec<&'static str> {
        requests.iter().map(Request::kind).collect()
    }

    fn title_slide() -> SlideDefinition {
        SlideDefinition {
            layout: SlideLayout::TitleAndBody,
            title: Some(TextBlock::plain("Hello")),
            bodies: vec![BodyDefinition {
                text: Some(TextBlock::plain("World")),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_object_ids_are_sequential() {
        let mut ids = ObjectIds::with_prefix("p");
        assert_eq!(ids.next("slide"), "p_slide1");
        assert_eq!(ids.next("title"), "p_title2");

        let generated = ObjectIds::new().next("slide");
        assert!(generated.starts_with("md2gs_"));
        assert_eq!(generated.len(), "md2gs_".len() + 12 + "_slide1".len());
    }

    #[test]
    fn test_create_slide_with_mappings() {
        let config = DeckConfig::default();
        let rendered = renderer(&config).render_slide(&title_slide(), 4).unwrap();

        assert_eq!(rendered.object_id, "t_slide1");
        assert_eq!(kinds(&rendered.requests), ["createSlide", "insertText", "insertText"]);
        let value = serde_json::to_value(&rendered.requests[0]).unwrap();
        assert_eq!(
            value,
            json!({"createSlide": {
                "objectId": "t_slide1",
                "insertionIndex": 4,
                "slideLayoutReference": {"predefinedLayout": "TITLE_AND_BODY"},
                "placeholderIdMappings": [
                    {"layoutPlaceholder": {"type": "TITLE", "index": 0}, "objectId": "t_title2"},
                    {"layoutPlaceholder": {"type": "BODY", "index": 0}, "objectId": "t_body3"}
                ]
            }})
        );
        assert_eq!(rendered.requests[1].object_id(), "t_title2");
    }

    #[test]
    fn test_requested_slide_id() {
        let config = DeckConfig::default();
        let mut slide = title_slide();
        slide.object_id = Some("intro_slide".into());
        let rendered = renderer(&config).render_slide(&slide, 0).unwrap();
        assert_eq!(rendered.object_id, "intro_slide");
    }

    #[test]
    fn test_text_over_capacity_is_skipped() {
        let config = DeckConfig::default();
        let mut slide = title_slide();
        slide.bodies.push(BodyDefinition {
            text: Some(TextBlock::plain("Extra")),
            ..Default::default()
        });
        let rendered = renderer(&config).render_slide(&slide, 0).unwrap();
        assert_eq!(kinds(&rendered.requests), ["createSlide", "insertText", "insertText"]);
    }

    #[test]
    fn test_text_block_runs_and_bullets() {
        let block = TextBlock {
            raw_text: "a\nb\n1\n2".into(),
            runs: vec![
                StyleRun::new(0, 1, TextStyle::bold()),
                StyleRun::new(2, 3, TextStyle::default()),
            ],
            list_markers: vec![
                ListMarker {
                    start: 0,
                    end: 3,
                    kind: ListKind::Bulleted,
                },
                ListMarker {
                    start: 4,
                    end: 7,
                    kind: ListKind::Numbered,
                },
            ],
        };
        let requests = text_block_requests("shape", None, &block);
        assert_eq!(
            kinds(&requests),
            ["insertText", "updateTextStyle", "createParagraphBullets", "createParagraphBullets"]
        );

        let style = serde_json::to_value(&requests[1]).unwrap();
        assert_eq!(style["updateTextStyle"]["fields"], "bold");
        assert_eq!(style["updateTextStyle"]["textRange"]["startIndex"], 0);

        let first = serde_json::to_value(&requests[2]).unwrap();
        assert_eq!(first["createParagraphBullets"]["bulletPreset"], NUMBERED_PRESET);
        assert_eq!(first["createParagraphBullets"]["textRange"]["startIndex"], 4);
    }

    #[test]
    fn test_media_and_background() {
        let config = DeckConfig::default();
        let slide = SlideDefinition {
            layout: SlideLayout::Blank,
            bodies: vec![BodyDefinition {
                images: vec![
                    ImageDefinition::new("https://example.com/a.png"),
                    ImageDefinition::new("local.png"),
                ],
                videos: vec![VideoDefinition {
                    service: VideoService::Youtube,
                    id: "dQw4w9WgXcQ".into(),
                }],
                tables: vec![TableDefinition::from_rows(vec![vec![
                    TextBlock::plain("x"),
                    TextBlock::default(),
                ]])],
                ..Default::default()
            }],
            background_image: Some(ImageDefinition::new("https://example.com/bg.png")),
            ..Default::default()
        };
        let rendered = renderer(&config).render_slide(&slide, 0).unwrap();
        assert_eq!(
            kinds(&rendered.requests),
            ["createSlide", "createImage", "createVideo", "createTable", "insertText", "updatePageProperties"]
        );

        let cell = serde_json::to_value(&rendered.requests[4]).unwrap();
        assert_eq!(cell["insertText"]["cellLocation"], json!({"rowIndex": 0, "columnIndex": 0}));

        // Three media items share the page area side by side
        let image = serde_json::to_value(&rendered.requests[1]).unwrap();
        let video = serde_json::to_value(&rendered.requests[2]).unwrap();
        let image_x = image["createImage"]["elementProperties"]["transform"]["translateX"]
            .as_f64()
            .unwrap();
        let video_x = video["createVideo"]["elementProperties"]["transform"]["translateX"]
            .as_f64()
            .unwrap();
        assert!(video_x > image_x);
        assert_eq!(video["createVideo"]["source"], "YOUTUBE");
    }

    #[test]
    fn test_custom_layout_uses_layout_id() {
        let presentation: Presentation = serde_json::from_value(json!({
            "presentationId": "p1",
            "layouts": [{
                "objectId": "layout9",
                "layoutProperties": {"name": "CUSTOM_1", "displayName": "Quote"},
                "pageElements": [{
                    "objectId": "ph_title",
                    "shape": {"placeholder": {"type": "TITLE"}}
                }]
            }]
        }))
        .unwrap();
        let meta = PresentationMeta::from_presentation(&presentation, "p1");
        let config = DeckConfig::default();
        let mut slide = title_slide();
        slide.bodies.clear();
        slide.custom_layout = Some("quote".into());

        let mut renderer = SlideRenderer::with_ids(&config, Some(&meta), ObjectIds::with_prefix("t"));
        let rendered = renderer.render_slide(&slide, 0).unwrap();
        let value = serde_json::to_value(&rendered.requests[0]).unwrap();
        assert_eq!(value["createSlide"]["slideLayoutReference"]["layoutId"], "layout9");
        assert_eq!(
            value["createSlide"]["placeholderIdMappings"][0]["layoutPlaceholderObjectId"],
            "ph_title"
        );

        slide.custom_layout = Some("Missing".into());
        let err = renderer.render_slide(&slide, 0).unwrap_err();
        assert_eq!(err.code(), "SLIDES002");
    }

    #[test]
    fn test_render_deck_offsets() {
        let config = DeckConfig::default();
        let mut deck = Deck::new();
        deck.push(title_slide());
        deck.push(title_slide());
        let rendered = renderer(&config).render_deck(&deck, 3).unwrap();
        let index = |r: &RenderedSlide| match &r.requests[0] {
            Request::CreateSlide(create) => create.insertion_index,
            _ => None,
        };
        assert_eq!(index(&rendered[0]), Some(3));
        assert_eq!(index(&rendered[1]), Some(4));
    }
}
