//! Layout selection and placeholder geometry.
//!
//! A slide's layout is picked from the shape of its content. Placeholder
//! boxes come from the remote layout when a presentation snapshot is at
//! hand, otherwise from [`LayoutConfig`].

use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::meta::{LayoutMeta, PresentationMeta};
use crate::slide::{PlaceholderRole, SlideDefinition, SlideLayout};

/// Margin around the page used for media on layouts without a body, in EMU
pub const PAGE_MARGIN_EMU: f64 = 311_700.0;

/// A rectangle in EMU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn from_tuple(rect: (f64, f64, f64, f64)) -> Self {
        Self::new(rect.0, rect.1, rect.2, rect.3)
    }

    /// Upper half of the rectangle
    pub fn upper_half(&self) -> Self {
        Self::new(self.x, self.y, self.width, self.height / 2.0)
    }

    /// Lower half of the rectangle
    pub fn lower_half(&self) -> Self {
        Self::new(self.x, self.y + self.height / 2.0, self.width, self.height / 2.0)
    }

    /// Split horizontally into `count` equal slots separated by `gap`
    pub fn columns(&self, count: usize, gap: f64) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let gaps = gap * (count - 1) as f64;
        let width = ((self.width - gaps) / count as f64).max(0.0);
        (0..count)
            .map(|i| Rect::new(self.x + i as f64 * (width + gap), self.y, width, self.height))
            .collect()
    }
}

/// Pick a predefined layout from the slide's content
pub fn match_layout(slide: &SlideDefinition) -> SlideLayout {
    let bodies = slide.content_bodies().count();
    let has_title = slide.title.is_some();
    let has_subtitle = slide.subtitle.is_some();

    match (has_title, has_subtitle, bodies) {
        (false, false, 0) => SlideLayout::Blank,
        (_, true, 0) => SlideLayout::Title,
        (true, false, 0) if slide.big => SlideLayout::MainPoint,
        (true, false, 0) => SlideLayout::SectionHeader,
        (true, _, 1) if slide.big => SlideLayout::BigNumber,
        (_, _, 1) => SlideLayout::TitleAndBody,
        _ => SlideLayout::TitleAndTwoColumns,
    }
}

/// Settle the slide's layout.
///
/// A forced predefined name replaces the matched layout. A forced name the
/// snapshot does not know is dropped with a warning; without a snapshot it
/// is kept for the renderer to resolve.
pub fn resolve_layout(slide: &mut SlideDefinition, meta: Option<&PresentationMeta>) {
    slide.layout = match_layout(slide);

    let Some(name) = slide.custom_layout.clone() else {
        return;
    };
    if let Some(layout) = SlideLayout::from_name(&name) {
        slide.layout = layout;
        slide.custom_layout = None;
    } else if let Some(meta) = meta {
        if meta.layout_named(&name).is_none() {
            warn!(slide = slide.index, layout = %name, "Unknown layout, using matched layout");
            slide.custom_layout = None;
        }
    }
    debug!(
        slide = slide.index,
        layout = slide.layout.api_name(),
        custom = slide.custom_layout.as_deref().unwrap_or_default(),
        "Resolved layout"
    );
}

/// Looks up placeholder geometry for slides
#[derive(Debug, Clone, Copy)]
pub struct LayoutResolver<'a> {
    config: &'a LayoutConfig,
    meta: Option<&'a PresentationMeta>,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(config: &'a LayoutConfig, meta: Option<&'a PresentationMeta>) -> Self {
        Self { config, meta }
    }

    /// Remote layout page a slide will be created from, if known
    pub fn remote_layout(&self, slide: &SlideDefinition) -> Option<&'a LayoutMeta> {
        let meta = self.meta?;
        match &slide.custom_layout {
            Some(name) => meta.layout_named(name),
            None => meta.layout_named(slide.layout.api_name()),
        }
    }

    /// Number of placeholders for `role` on the slide's layout
    pub fn capacity(&self, slide: &SlideDefinition, role: PlaceholderRole) -> usize {
        if let Some(layout) = self.remote_layout(slide) {
            return layout
                .placeholders
                .iter()
                .filter(|p| p.placeholder_type.as_deref().is_some_and(|t| role.accepts(t)))
                .count();
        }
        match role {
            PlaceholderRole::Title => usize::from(slide.layout.title_placeholder_type().is_some()),
            PlaceholderRole::Subtitle => usize::from(slide.layout.has_subtitle()),
            PlaceholderRole::Body => slide.layout.body_count(),
        }
    }

    /// Box of the `index`th placeholder for `role`
    pub fn placeholder_box(
        &self,
        slide: &SlideDefinition,
        role: PlaceholderRole,
        index: usize,
    ) -> Option<Rect> {
        if let Some(layout) = self.remote_layout(slide) {
            if let Some(bounds) = layout
                .placeholder(|t| role.accepts(t), index)
                .and_then(|p| p.bounds())
            {
                return Some(Rect::from_tuple(bounds));
            }
        }
        self.config
            .placeholder_box(slide.layout, role, index)
            .map(|b| Rect::new(b.x, b.y, b.width, b.height))
    }

    /// Area available for media of the `index`th body. Falls back to the
    /// page inside a margin, and to the lower half when the body also
    /// carries text.
    pub fn media_area(&self, slide: &SlideDefinition, index: usize) -> Rect {
        let area = self
            .placeholder_box(slide, PlaceholderRole::Body, index)
            .unwrap_or_else(|| self.page_area());
        let has_text = slide
            .bodies
            .get(index)
            .and_then(|b| b.text.as_ref())
            .is_some_and(|t| !t.is_empty());
        if has_text {
            area.lower_half()
        } else {
            area
        }
    }

    /// The page inside [`PAGE_MARGIN_EMU`]
    pub fn page_area(&self) -> Rect {
        match self.meta.and_then(|m| m.page_size) {
            Some(size) => Rect::new(
                PAGE_MARGIN_EMU,
                PAGE_MARGIN_EMU,
                (size.width.to_emu() - 2.0 * PAGE_MARGIN_EMU).max(0.0),
                (size.height.to_emu() - 2.0 * PAGE_MARGIN_EMU).max(0.0),
            ),
            None => Rect::from_tuple(self.config.page_box(PAGE_MARGIN_EMU)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::{BodyDefinition, ImageDefinition};
    use crate::wire::Presentation;
    use md2gs_text::TextBlock;
    use serde_json::json;

    fn slide(title: bool, subtitle: bool, bodies: usize) -> SlideDefinition {
        let mut slide = SlideDefinition::new(0);
        if title {
            slide.title = Some(TextBlock::plain("Title"));
        }
        if subtitle {
            slide.subtitle = Some(TextBlock::plain("Subtitle"));
        }
        for i in 0..bodies {
            slide.bodies.push(BodyDefinition {
                text: Some(TextBlock::plain(format!("Body {i}"))),
                ..Default::default()
            });
        }
        slide
    }

    #[test]
    fn test_match_layout() {
        assert_eq!(match_layout(&slide(false, false, 0)), SlideLayout::Blank);
        assert_eq!(match_layout(&slide(true, true, 0)), SlideLayout::Title);
        assert_eq!(match_layout(&slide(true, false, 0)), SlideLayout::SectionHeader);
        assert_eq!(match_layout(&slide(true, false, 1)), SlideLayout::TitleAndBody);
        assert_eq!(match_layout(&slide(false, false, 1)), SlideLayout::TitleAndBody);
        assert_eq!(match_layout(&slide(true, false, 2)), SlideLayout::TitleAndTwoColumns);

        let mut big = slide(true, false, 0);
        big.big = true;
        assert_eq!(match_layout(&big), SlideLayout::MainPoint);
        big.bodies.push(BodyDefinition {
            text: Some(TextBlock::plain("of users")),
            ..Default::default()
        });
        assert_eq!(match_layout(&big), SlideLayout::BigNumber);
    }

    #[test]
    fn test_empty_bodies_do_not_count() {
        let mut s = slide(true, false, 0);
        s.bodies.push(BodyDefinition::default());
        assert_eq!(match_layout(&s), SlideLayout::SectionHeader);
    }

    #[test]
    fn test_resolve_forced_layout() {
        let mut s = slide(true, false, 1);
        s.custom_layout = Some("main point".into());
        resolve_layout(&mut s, None);
        assert_eq!(s.layout, SlideLayout::MainPoint);
        assert!(s.custom_layout.is_none());

        let mut s = slide(true, false, 1);
        s.custom_layout = Some("Brand Layout".into());
        resolve_layout(&mut s, None);
        assert_eq!(s.layout, SlideLayout::TitleAndBody);
        assert_eq!(s.custom_layout.as_deref(), Some("Brand Layout"));

        let meta = PresentationMeta::from_presentation(&Presentation::default(), "deck1");
        resolve_layout(&mut s, Some(&meta));
        assert!(s.custom_layout.is_none());
    }

    #[test]
    fn test_boxes_from_config_and_remote() {
        let config = LayoutConfig::default();
        let mut s = slide(true, false, 1);
        resolve_layout(&mut s, None);

        let resolver = LayoutResolver::new(&config, None);
        let body = resolver.placeholder_box(&s, PlaceholderRole::Body, 0).unwrap();
        assert_eq!(body.width, 8_520_600.0);
        assert_eq!(resolver.capacity(&s, PlaceholderRole::Body), 1);
        assert_eq!(resolver.capacity(&s, PlaceholderRole::Subtitle), 0);

        let presentation: Presentation = serde_json::from_value(json!({
            "presentationId": "deck1",
            "layouts": [{
                "objectId": "l_tb",
                "layoutProperties": {"name": "TITLE_AND_BODY", "displayName": "Title and body"},
                "pageElements": [{
                    "objectId": "l_tb_body",
                    "shape": {"placeholder": {"type": "BODY"}},
                    "size": {"width": {"magnitude": 4000000, "unit": "EMU"}, "height": {"magnitude": 2000000, "unit": "EMU"}},
                    "transform": {"scaleX": 1, "scaleY": 1, "translateX": 100, "translateY": 200, "unit": "EMU"}
                }]
            }]
        }))
        .unwrap();
        let meta = PresentationMeta::from_presentation(&presentation, "deck1");
        let resolver = LayoutResolver::new(&config, Some(&meta));
        let body = resolver.placeholder_box(&s, PlaceholderRole::Body, 0).unwrap();
        assert_eq!(body, Rect::new(100.0, 200.0, 4_000_000.0, 2_000_000.0));
        // The remote layout has no title placeholder
        assert_eq!(resolver.capacity(&s, PlaceholderRole::Title), 0);
    }

    #[test]
    fn test_media_area() {
        let config = LayoutConfig::default();
        let resolver = LayoutResolver::new(&config, None);

        let mut s = SlideDefinition::new(0);
        s.bodies.push(BodyDefinition {
            images: vec![ImageDefinition::new("https://example.com/a.png")],
            ..Default::default()
        });
        resolve_layout(&mut s, None);
        let full = resolver.media_area(&s, 0);
        assert_eq!(full.height, 3_416_400.0);

        s.bodies[0].text = Some(TextBlock::plain("caption"));
        let half = resolver.media_area(&s, 0);
        assert_eq!(half.height, full.height / 2.0);

        let mut blank = SlideDefinition::new(0);
        resolve_layout(&mut blank, None);
        assert_eq!(blank.layout, SlideLayout::Blank);
        assert_eq!(resolver.media_area(&blank, 0), resolver.page_area());
    }

    #[test]
    fn test_rect_columns() {
        let slots = Rect::new(0.0, 0.0, 1000.0, 100.0).columns(3, 50.0);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].width, 300.0);
        assert_eq!(slots[2].x, 700.0);
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).columns(0, 0.0).is_empty());
    }
}
