//! Deck compilation from Markdown.
//!
//! Walks the token stream and builds [`SlideDefinition`]s:
//!
//! - `---` starts a new slide
//! - The first `#` heading is the title, a `##` heading before any body
//!   content is the subtitle, other headings become bold body paragraphs
//! - `{.big}` on the title picks the big layouts, `{layout="NAME"}` forces
//!   a layout, a `{.column}` paragraph starts the next body column
//! - Images go to the body, or to the background with `{.background}`
//! - HTML comments become speaker notes
//!
//! Once a slide is complete its layout is settled and every text block is
//! auto-fitted to the placeholder it will land in.

use std::path::Path;
use std::sync::OnceLock;

use md2gs_markdown::css::parse_declarations;
use md2gs_markdown::{Attributes, Highlighter, Tag, Token, Tokenizer};
use md2gs_text::constants::LINE_SEPARATOR;
use md2gs_text::{points_to_emu, BoxSize, FontRegistry, ListKind, TextBlock, TextBuilder, TextStyle};
use regex::Regex;
use tracing::{debug, info};

use crate::config::DeckConfig;
use crate::error::Result;
use crate::layout::{resolve_layout, LayoutResolver, Rect};
use crate::meta::PresentationMeta;
use crate::slide::{
    BodyDefinition, Deck, GeneratedImageDefinition, ImageDefinition, PlaceholderRole,
    SlideDefinition, TableDefinition, VideoDefinition,
};

static COMMENT: OnceLock<Regex> = OnceLock::new();

/// A compilation session: tokenizer, highlighter and font registry built
/// from one [`DeckConfig`]
#[derive(Debug)]
pub struct DeckCompiler {
    config: DeckConfig,
    tokenizer: Tokenizer,
    highlighter: Highlighter,
    registry: FontRegistry,
}

impl DeckCompiler {
    /// Create a session. Font files and the theme are resolved relative to
    /// the working directory.
    pub fn new(config: DeckConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a session resolving font files and the theme relative to `base_dir`
    pub fn with_base_dir(config: DeckConfig, base_dir: &Path) -> Result<Self> {
        Self::build(config, Some(base_dir))
    }

    fn build(config: DeckConfig, base_dir: Option<&Path>) -> Result<Self> {
        config.validate()?;
        let registry = config.font_registry(base_dir)?;
        let highlighter = Highlighter::new(config.stylesheet(base_dir)?);
        Ok(Self::from_parts(config, registry, highlighter))
    }

    /// Assemble a session from prepared parts
    pub fn from_parts(config: DeckConfig, registry: FontRegistry, highlighter: Highlighter) -> Self {
        Self {
            tokenizer: Tokenizer::new(config.markdown.clone()),
            config,
            highlighter,
            registry,
        }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Compile with placeholder boxes from the configuration
    pub fn compile(&self, markdown: &str) -> Deck {
        self.compile_for(markdown, None)
    }

    /// Compile against a presentation snapshot, whose layouts provide
    /// placeholder boxes and custom layout names
    pub fn compile_for(&self, markdown: &str, meta: Option<&PresentationMeta>) -> Deck {
        let tokens = self.tokenizer.parse(markdown);
        let mut deck = SlideExtractor::new(&self.config, &self.highlighter).run(&tokens);

        let resolver = LayoutResolver::new(&self.config.layout, meta);
        for slide in &mut deck.slides {
            resolve_layout(slide, meta);
            self.fit_slide(slide, &resolver);
        }

        info!(slides = deck.len(), "Compiled deck");
        deck
    }

    fn fit_slide(&self, slide: &mut SlideDefinition, resolver: &LayoutResolver<'_>) {
        let title_box = resolver.placeholder_box(slide, PlaceholderRole::Title, 0);
        let subtitle_box = resolver.placeholder_box(slide, PlaceholderRole::Subtitle, 0);
        let body_boxes: Vec<Option<Rect>> = (0..slide.bodies.len())
            .map(|i| resolver.placeholder_box(slide, PlaceholderRole::Body, i))
            .collect();

        if let (Some(block), Some(rect)) = (slide.title.as_mut(), title_box) {
            self.fit_block(block, rect);
        }
        if let (Some(block), Some(rect)) = (slide.subtitle.as_mut(), subtitle_box) {
            self.fit_block(block, rect);
        }
        for (body, rect) in slide.bodies.iter_mut().zip(body_boxes) {
            // Media take the lower half of a body that also has text
            let shared = body.has_media();
            if let (Some(block), Some(rect)) = (body.text.as_mut(), rect) {
                let rect = if shared { rect.upper_half() } else { rect };
                self.fit_block(block, rect);
            }
        }
    }

    /// Size `block` so its text fits `rect`
    pub fn fit_block(&self, block: &mut TextBlock, rect: Rect) {
        if block.is_empty() {
            return;
        }
        let family = block
            .font_family()
            .unwrap_or(&self.config.fonts.family)
            .to_string();
        let fit = &self.config.autofit;
        let size = fit.fitter().fit(
            &self.registry,
            &block.raw_text,
            BoxSize::from_emu(rect.width, rect.height),
            &family,
        );
        block.apply_font_size(size, fit.base_pt, fit.scale);
        debug!(family = %family, size, chars = block.len(), "Fitted text block");
    }
}

/// Compile `markdown` with a fresh session for `config`
pub fn compile(markdown: &str, config: &DeckConfig) -> Result<Deck> {
    Ok(DeckCompiler::new(config.clone())?.compile(markdown))
}

/// Where inline content currently goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Title,
    Subtitle,
    Body,
    Cell,
}

/// What a heading turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingRole {
    Title,
    Subtitle,
    Body,
}

#[derive(Debug)]
struct ListState {
    kind: ListKind,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<TextBlock>>,
    row: Vec<TextBlock>,
    cell: Option<TextBuilder>,
    in_head: bool,
}

/// Body column under construction
#[derive(Debug, Default)]
struct BodyState {
    text: TextBuilder,
    media: BodyDefinition,
    /// Offset where the outermost open list starts
    list_start: Option<usize>,
    /// Offset right after the latest list item break
    item_start: Option<usize>,
}

impl BodyState {
    fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.media.has_media()
    }

    fn finish(self) -> BodyDefinition {
        let text = self.text.finish();
        BodyDefinition {
            text: (!text.is_empty()).then_some(text),
            ..self.media
        }
    }
}

/// Token walker building slides
struct SlideExtractor<'a> {
    config: &'a DeckConfig,
    highlighter: &'a Highlighter,
    deck: Deck,
    slide: SlideDefinition,
    title: Option<TextBuilder>,
    subtitle: Option<TextBuilder>,
    body: BodyState,
    target: Target,
    headings: Vec<HeadingRole>,
    /// Whether each open paragraph opened a style scope
    paragraph_styles: Vec<bool>,
    lists: Vec<ListState>,
    table: Option<TableState>,
    quote_depth: usize,
    /// Separator emitted before the next body text
    pending: Option<String>,
}

impl<'a> SlideExtractor<'a> {
    fn new(config: &'a DeckConfig, highlighter: &'a Highlighter) -> Self {
        Self {
            config,
            highlighter,
            deck: Deck::new(),
            slide: SlideDefinition::new(0),
            title: None,
            subtitle: None,
            body: BodyState::default(),
            target: Target::Body,
            headings: Vec::new(),
            paragraph_styles: Vec::new(),
            lists: Vec::new(),
            table: None,
            quote_depth: 0,
            pending: None,
        }
    }

    fn run(mut self, tokens: &[Token]) -> Deck {
        for token in tokens {
            self.handle(token);
        }
        self.flush_slide();
        self.deck
    }

    fn handle(&mut self, token: &Token) {
        match token {
            Token::Open { tag, attrs } => self.open(tag, attrs),
            Token::Close { tag } => self.close(tag),
            Token::Text { content } => self.append(content),
            Token::Code { content, attrs } => {
                let style = self.inline_style(TextStyle::family(&self.config.fonts.monospace), attrs);
                self.with_style(style, |this| this.append(content));
            }
            Token::SoftBreak => self.append(" "),
            Token::HardBreak => self.append(&LINE_SEPARATOR.to_string()),
            Token::Rule => self.flush_slide(),
            Token::Html { content } => self.handle_html(content),
            Token::CodeBlock {
                language, content, ..
            } => self.handle_code_block(language.as_deref(), content),
            Token::Image {
                url,
                title,
                alt,
                attrs,
            } => self.handle_image(url, title, alt, attrs),
            Token::Emoji { glyph, .. } => self.append(glyph),
            Token::Video { service, id } => self.body.media.videos.push(VideoDefinition {
                service: *service,
                id: id.clone(),
            }),
            Token::GeneratedImage { params, content } => {
                self.body
                    .media
                    .generated_images
                    .push(GeneratedImageDefinition {
                        params: params.clone(),
                        source: content.clone(),
                    })
            }
        }
    }

    fn open(&mut self, tag: &Tag, attrs: &Attributes) {
        match tag {
            Tag::Heading(level) => self.open_heading(*level, attrs),
            Tag::Paragraph => {
                if attrs.has_class("column") {
                    self.next_column();
                }
                self.apply_slide_attributes(attrs, false);
                if self.target != Target::Body {
                    self.paragraph_styles.push(false);
                    return;
                }
                self.begin_paragraph();
                let mut style = TextStyle::default();
                if self.quote_depth > 0 {
                    style = TextStyle::italic();
                }
                let style = self.inline_style(style, attrs);
                let styled = !style.is_empty();
                if styled {
                    self.flush_pending();
                    self.body.text.start_style(style);
                }
                self.paragraph_styles.push(styled);
            }
            Tag::BlockQuote => self.quote_depth += 1,
            Tag::List { start } => {
                let kind = if start.is_some() {
                    ListKind::Numbered
                } else {
                    ListKind::Bulleted
                };
                self.lists.push(ListState { kind });
            }
            Tag::ListItem => self.open_list_item(),
            Tag::Table => self.table = Some(TableState::default()),
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.row.clear();
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let mut cell = TextBuilder::new();
                    if table.in_head {
                        cell.start_style(TextStyle::bold());
                    }
                    table.cell = Some(cell);
                    self.target = Target::Cell;
                }
            }
            Tag::Emphasis => self.start_inline(TextStyle::italic(), attrs),
            Tag::Strong => self.start_inline(TextStyle::bold(), attrs),
            Tag::Strikethrough => self.start_inline(
                TextStyle {
                    strikethrough: Some(true),
                    ..Default::default()
                },
                attrs,
            ),
            Tag::Link { url, .. } => self.start_inline(TextStyle::link(url), attrs),
        }
    }

    fn close(&mut self, tag: &Tag) {
        match tag {
            Tag::Heading(_) => match self.headings.pop() {
                Some(HeadingRole::Body) => self.body.text.end_style(),
                Some(HeadingRole::Title | HeadingRole::Subtitle) => self.target = Target::Body,
                None => {}
            },
            Tag::Paragraph => {
                if self.paragraph_styles.pop() == Some(true) {
                    self.body.text.end_style();
                }
            }
            Tag::BlockQuote => self.quote_depth = self.quote_depth.saturating_sub(1),
            Tag::List { .. } => {
                if let Some(list) = self.lists.pop() {
                    if self.lists.is_empty() {
                        if let Some(start) = self.body.list_start.take() {
                            self.body.text.mark_list(start, list.kind);
                        }
                    }
                }
            }
            Tag::ListItem => {}
            Tag::Table => {
                if let Some(table) = self.table.take() {
                    let definition = TableDefinition::from_rows(table.rows);
                    if !definition.is_empty() {
                        self.body.media.tables.push(definition);
                    }
                }
                self.target = Target::Body;
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    table.in_head = false;
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.take() {
                        table.row.push(cell.finish());
                    }
                }
                self.target = Target::Body;
            }
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } => {
                if let Some(builder) = self.builder() {
                    builder.end_style();
                }
            }
        }
    }

    fn has_body_content(&self) -> bool {
        !self.body.is_empty() || !self.slide.bodies.is_empty()
    }

    fn open_heading(&mut self, level: u8, attrs: &Attributes) {
        let role = if level == 1 && self.title.is_none() && !self.has_body_content() {
            HeadingRole::Title
        } else if level == 2 && self.subtitle.is_none() && !self.has_body_content() {
            HeadingRole::Subtitle
        } else {
            HeadingRole::Body
        };
        self.headings.push(role);

        match role {
            HeadingRole::Title => {
                self.apply_slide_attributes(attrs, true);
                self.title = Some(TextBuilder::new());
                self.target = Target::Title;
            }
            HeadingRole::Subtitle => {
                self.apply_slide_attributes(attrs, false);
                self.subtitle = Some(TextBuilder::new());
                self.target = Target::Subtitle;
            }
            HeadingRole::Body => {
                self.apply_slide_attributes(attrs, false);
                self.target = Target::Body;
                self.begin_paragraph();
                self.flush_pending();
                self.body.text.start_style(TextStyle::bold());
            }
        }
    }

    /// Slide-level attributes: `layout=`, and on the title `.big` and `#id`
    fn apply_slide_attributes(&mut self, attrs: &Attributes, on_title: bool) {
        if let Some(layout) = attrs.get("layout") {
            self.slide.custom_layout = Some(layout.to_string());
        }
        if on_title {
            if attrs.has_class("big") {
                self.slide.big = true;
            }
            if let Some(id) = &attrs.id {
                self.slide.object_id = Some(id.clone());
            }
        }
    }

    fn open_list_item(&mut self) {
        if self.target != Target::Body {
            return;
        }
        self.pending = None;
        if !self.body.text.is_empty() {
            self.body.text.append_text("\n");
        }
        let offset = self.body.text.len();
        self.body.list_start.get_or_insert(offset);
        self.body.item_start = Some(offset);
        let depth = self.lists.len().saturating_sub(1);
        if depth > 0 {
            self.pending = Some("\t".repeat(depth));
        }
    }

    /// Queue a paragraph break unless one is already queued or the
    /// paragraph opens a list item
    fn begin_paragraph(&mut self) {
        let len = self.body.text.len();
        if self.pending.is_some() || len == 0 || self.body.item_start == Some(len) {
            return;
        }
        self.pending = Some("\n".to_string());
    }

    fn flush_pending(&mut self) {
        if let Some(prefix) = self.pending.take() {
            self.body.text.append_text(&prefix);
        }
    }

    fn builder(&mut self) -> Option<&mut TextBuilder> {
        match self.target {
            Target::Title => self.title.as_mut(),
            Target::Subtitle => self.subtitle.as_mut(),
            Target::Cell => self.table.as_mut().and_then(|t| t.cell.as_mut()),
            Target::Body => Some(&mut self.body.text),
        }
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.target == Target::Body {
            self.flush_pending();
        }
        if let Some(builder) = self.builder() {
            builder.append_text(text);
        }
    }

    /// `style` with an inline `style="..."` attribute layered on top
    fn inline_style(&self, style: TextStyle, attrs: &Attributes) -> TextStyle {
        match attrs.get("style") {
            Some(css) => parse_declarations(css).merged_onto(&style),
            None => style,
        }
    }

    fn start_inline(&mut self, style: TextStyle, attrs: &Attributes) {
        let style = self.inline_style(style, attrs);
        if self.target == Target::Body {
            self.flush_pending();
        }
        if let Some(builder) = self.builder() {
            builder.start_style(style);
        }
    }

    fn with_style(&mut self, style: TextStyle, f: impl FnOnce(&mut Self)) {
        self.start_inline(style, &Attributes::default());
        f(self);
        if let Some(builder) = self.builder() {
            builder.end_style();
        }
    }

    /// Every comment in `content` becomes one line of the speaker notes.
    /// Adjacent HTML blocks arrive merged, so one token may hold several.
    fn handle_html(&mut self, content: &str) {
        let comment = COMMENT.get_or_init(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());
        let mut found = false;
        for caps in comment.captures_iter(content) {
            found = true;
            let Some(note) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if note.is_empty() {
                continue;
            }
            match self.slide.notes.as_mut() {
                Some(notes) => {
                    notes.push('\n');
                    notes.push_str(note);
                }
                None => self.slide.notes = Some(note.to_string()),
            }
        }
        if !found {
            debug!(html = content.trim(), "Ignoring HTML");
        }
    }

    fn handle_code_block(&mut self, language: Option<&str>, content: &str) {
        if self.target != Target::Body {
            return;
        }
        self.begin_paragraph();
        self.flush_pending();
        self.body
            .text
            .start_style(TextStyle::family(&self.config.fonts.monospace));
        self.highlighter.highlight(content, language, &mut self.body.text);
        self.body.text.end_style();
    }

    fn handle_image(&mut self, url: &str, title: &str, alt: &str, attrs: &Attributes) {
        let dimension = |key: &str| {
            attrs
                .get(key)
                .and_then(|v| v.trim_end_matches("pt").parse::<f64>().ok())
                .filter(|v| *v > 0.0)
                .map(points_to_emu)
        };
        let image = ImageDefinition {
            url: url.to_string(),
            alt: alt.to_string(),
            title: (!title.is_empty()).then(|| title.to_string()),
            width: dimension("width"),
            height: dimension("height"),
        };
        if attrs.has_class("background") {
            self.slide.background_image = Some(image);
        } else {
            self.body.media.images.push(image);
        }
    }

    /// Close the current body column
    fn next_column(&mut self) {
        if self.body.is_empty() {
            return;
        }
        let body = std::mem::take(&mut self.body);
        self.slide.bodies.push(body.finish());
        self.pending = None;
        self.lists.clear();
    }

    fn flush_slide(&mut self) {
        let mut slide = std::mem::take(&mut self.slide);
        slide.title = self.title.take().map(TextBuilder::finish);
        slide.subtitle = self.subtitle.take().map(TextBuilder::finish);
        let body = std::mem::take(&mut self.body);
        slide.bodies.push(body.finish());
        slide.bodies.retain(|b| !b.is_empty());

        self.target = Target::Body;
        self.headings.clear();
        self.paragraph_styles.clear();
        self.lists.clear();
        self.table = None;
        self.quote_depth = 0;
        self.pending = None;

        if slide.is_empty() {
            return;
        }
        debug!(
            index = self.deck.len(),
            title = slide.title_text().unwrap_or_default(),
            bodies = slide.bodies.len(),
            "Extracted slide"
        );
        self.deck.push(slide);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::SlideLayout;
    use md2gs_markdown::VideoService;

    fn compile_default(markdown: &str) -> Deck {
        DeckCompiler::new(DeckConfig::default()).unwrap().compile(markdown)
    }

    #[test]
    fn test_rules_split_slides() {
        let deck = compile_default("# One\n\n---\n\n# Two\n\n---\n\n---\n\n# Three");
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slides[2].title_text(), Some("Three"));
        assert_eq!(deck.slides[2].index, 2);
    }

    #[test]
    fn test_title_and_subtitle() {
        let deck = compile_default("# Welcome\n\n## To the show");
        let slide = &deck.slides[0];
        assert_eq!(slide.title_text(), Some("Welcome"));
        assert_eq!(slide.subtitle.as_ref().unwrap().raw_text, "To the show");
        assert_eq!(slide.layout, SlideLayout::Title);
        assert!(slide.bodies.is_empty());
    }

    #[test]
    fn test_late_headings_are_bold_body() {
        let deck = compile_default("# Title\n\nIntro\n\n## Details\n\nMore");
        let slide = &deck.slides[0];
        assert!(slide.subtitle.is_none());
        let body = slide.bodies[0].text.as_ref().unwrap();
        assert_eq!(body.raw_text, "Intro\nDetails\nMore");
        assert!(body
            .runs
            .iter()
            .any(|r| r.style.bold == Some(true) && (r.start, r.end) == (6, 13)));
    }

    #[test]
    fn test_big_title_layouts() {
        let deck = compile_default("# Thanks {.big}\n\n---\n\n# 42% {.big}\n\nof users agree");
        assert_eq!(deck.slides[0].layout, SlideLayout::MainPoint);
        assert!(deck.slides[0].big);
        assert_eq!(deck.slides[1].layout, SlideLayout::BigNumber);
    }

    #[test]
    fn test_forced_layout_and_id() {
        let deck = compile_default("# Title {#intro layout=\"SECTION_HEADER\"}\n\nBody text");
        let slide = &deck.slides[0];
        assert_eq!(slide.layout, SlideLayout::SectionHeader);
        assert_eq!(slide.object_id.as_deref(), Some("intro"));
    }

    #[test]
    fn test_columns() {
        let deck = compile_default("# Compare\n\nLeft side\n\n{.column}\n\nRight side");
        let slide = &deck.slides[0];
        assert_eq!(slide.layout, SlideLayout::TitleAndTwoColumns);
        assert_eq!(slide.bodies.len(), 2);
        assert_eq!(slide.bodies[0].text.as_ref().unwrap().raw_text, "Left side");
        assert_eq!(slide.bodies[1].text.as_ref().unwrap().raw_text, "Right side");
    }

    #[test]
    fn test_nested_list_tabs_and_markers() {
        let deck = compile_default("# Agenda\n\nIntro\n\n* One\n    * Nested\n* Two\n\n1. First\n2. Second");
        let body = deck.slides[0].bodies[0].text.as_ref().unwrap();
        assert_eq!(body.raw_text, "Intro\nOne\n\tNested\nTwo\nFirst\nSecond");
        assert_eq!(body.list_markers.len(), 2);
        let bullets = &body.list_markers[0];
        assert_eq!(bullets.kind, ListKind::Bulleted);
        // Starts after "Intro\n", ends after "Two"
        assert_eq!((bullets.start, bullets.end), (6, 21));
        let numbers = &body.list_markers[1];
        assert_eq!(numbers.kind, ListKind::Numbered);
        assert_eq!(numbers.start, 22);
    }

    #[test]
    fn test_inline_styles() {
        let deck = compile_default("# T\n\nA *b* **c** ~~d~~ `e` [f](https://x.org)");
        let body = deck.slides[0].bodies[0].text.as_ref().unwrap();
        assert_eq!(body.raw_text, "A b c d e f");
        let style_at = |offset: usize| {
            body.runs
                .iter()
                .filter(|r| r.start <= offset && offset < r.end)
                .fold(TextStyle::default(), |acc, r| r.style.merged_onto(&acc))
        };
        assert_eq!(style_at(2).italic, Some(true));
        assert_eq!(style_at(4).bold, Some(true));
        assert_eq!(style_at(6).strikethrough, Some(true));
        assert_eq!(style_at(8).font_family.as_deref(), Some("Courier New"));
        assert_eq!(style_at(10).link.as_deref(), Some("https://x.org"));
        assert!(style_at(0).italic.is_none());
    }

    #[test]
    fn test_inline_style_attribute() {
        let deck = compile_default("# T\n\n*red*{style=color:red} plain");
        let body = deck.slides[0].bodies[0].text.as_ref().unwrap();
        let run = body
            .runs
            .iter()
            .find(|r| r.style.foreground_color.is_some())
            .unwrap();
        assert_eq!((run.start, run.end), (0, 3));
        assert_eq!(run.style.italic, Some(true));
    }

    #[test]
    fn test_code_block_uses_monospace() {
        let deck = compile_default("# Code\n\n```rust\nfn main() {}\nlet x = 1;\n```");
        let body = deck.slides[0].bodies[0].text.as_ref().unwrap();
        assert_eq!(body.raw_text, "fn main() {}\u{000b}let x = 1;");
        assert_eq!(body.font_family(), Some("Courier New"));
    }

    #[test]
    fn test_media_and_notes() {
        let deck = compile_default(
            "# Media\n\n![logo](https://example.com/logo.png){width=100}\n\n\
             ![bg](https://example.com/bg.png){.background}\n\n\
             @[youtube](dQw4w9WgXcQ)\n\n\
             $$$ chart\n1,2\n$$$\n\n\
             <!-- First note -->\n\n<!-- Second note -->",
        );
        let slide = &deck.slides[0];
        let body = &slide.bodies[0];
        assert!(body.text.is_none());
        assert_eq!(body.images.len(), 1);
        assert_eq!(body.images[0].alt, "logo");
        assert_eq!(body.images[0].width, Some(100.0 * 12_700.0));
        assert_eq!(body.videos[0].service, VideoService::Youtube);
        assert_eq!(body.generated_images[0].params, "chart");
        assert_eq!(
            slide.background_image.as_ref().unwrap().url,
            "https://example.com/bg.png"
        );
        assert_eq!(slide.notes.as_deref(), Some("First note\nSecond note"));
    }

    #[test]
    fn test_comments_on_consecutive_lines() {
        let deck = compile_default("# T\n\n<!-- First note -->\n<!-- Second note -->\n");
        assert_eq!(deck.slides[0].notes.as_deref(), Some("First note\nSecond note"));

        let deck = compile_default("# T\n\n<div>markup</div>\n\n<!---->");
        assert_eq!(deck.slides[0].notes, None);
    }

    #[test]
    fn test_text_beside_media_fits_upper_half() {
        let paragraph = "Quarterly revenue grew in every region we operate in. ".repeat(12);
        let markdown = format!("# Results\n\n{paragraph}\n\n![chart](https://example.com/chart.png)");
        let compiler = DeckCompiler::new(DeckConfig::default()).unwrap();
        let deck = compiler.compile(&markdown);
        let slide = &deck.slides[0];
        assert!(slide.bodies[0].has_media());

        let body_box = LayoutResolver::new(&compiler.config().layout, None)
            .placeholder_box(slide, PlaceholderRole::Body, 0)
            .unwrap();
        let half = BoxSize::from_emu(body_box.width, body_box.height / 2.0);

        let block = slide.bodies[0].text.as_ref().unwrap();
        let size = block.max_font_size(compiler.config().autofit.base_pt);
        let family = &compiler.config().fonts.family;
        let measured = compiler.registry().measure(&block.raw_text, size, half.width, family);
        assert!(measured.height <= half.height + 1e-6, "{} > {}", measured.height, half.height);

        let alone = compiler.compile(&format!("# Results\n\n{paragraph}"));
        let alone_size = alone.slides[0].bodies[0]
            .text
            .as_ref()
            .unwrap()
            .max_font_size(compiler.config().autofit.base_pt);
        assert!(size < alone_size, "{size} >= {alone_size}");
    }

    #[test]
    fn test_table() {
        let deck = compile_default("# Data\n\n| a | b |\n|---|---|\n| 1 | 2 |\n| 3 |   |");
        let table = &deck.slides[0].bodies[0].tables[0];
        assert_eq!((table.rows, table.columns), (3, 2));
        assert_eq!(table.cells[0][0].raw_text, "a");
        assert_eq!(table.cells[0][0].runs[0].style.bold, Some(true));
        assert_eq!(table.cells[2][0].raw_text, "3");
        assert!(deck.slides[0].bodies[0].text.is_none());
    }

    #[test]
    fn test_blockquote_is_italic() {
        let deck = compile_default("# Q\n\n> Quoted words");
        let body = deck.slides[0].bodies[0].text.as_ref().unwrap();
        assert_eq!(body.raw_text, "Quoted words");
        assert!(body.runs.iter().any(|r| r.style.italic == Some(true)));
    }

    #[test]
    fn test_text_is_fitted() {
        let deck = compile_default("# A fairly long title that needs room\n\nShort body");
        let slide = &deck.slides[0];
        let title = slide.title.as_ref().unwrap();
        let size = title.runs[0].style.font_size.unwrap().magnitude;
        assert!((8.0..=48.0).contains(&size));

        let body = slide.bodies[0].text.as_ref().unwrap();
        let body_size = body.runs[0].style.font_size.unwrap().magnitude;
        assert!((8.0..=48.0).contains(&body_size));
    }

    #[test]
    fn test_scale_shrinks_sizes() {
        let markdown = "# Title\n\nBody";
        let full = compile_default(markdown);
        let mut config = DeckConfig::default();
        config.autofit.scale = 0.8;
        let scaled = compile(markdown, &config).unwrap();

        let size = |deck: &Deck| {
            deck.slides[0].title.as_ref().unwrap().runs[0]
                .style
                .font_size
                .unwrap()
                .magnitude
        };
        assert!((size(&scaled) - size(&full) * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_empty_document() {
        assert!(compile_default("").is_empty());
        assert!(compile_default("---\n\n---").is_empty());
    }
}
