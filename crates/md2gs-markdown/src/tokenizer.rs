//! Markdown tokenizer.
//!
//! CommonMark parsing (tables and strikethrough enabled) is delegated to
//! `pulldown-cmark`. The event stream is flattened into [`Token`]s and run
//! through a fixed pipeline of extension stages, each of which can be
//! switched off in [`TokenizerOptions`].

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag as MdTag};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes;
use crate::source::{self, GENERATED_IMAGE_SENTINEL};
use crate::stages;
use crate::token::{Attributes, Tag, Token};

/// Default tab width for tab expansion
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Named extension stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExpandTabs,
    GeneratedImages,
    LazyHeaders,
    Attributes,
    Video,
    Emoji,
}

impl Stage {
    /// Stages that rewrite the source text, in order
    pub const SOURCE: [Stage; 3] = [Stage::ExpandTabs, Stage::GeneratedImages, Stage::LazyHeaders];

    /// Stages that rewrite the token stream, in order
    pub const TOKENS: [Stage; 3] = [Stage::Attributes, Stage::Video, Stage::Emoji];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExpandTabs => "expand_tabs",
            Stage::GeneratedImages => "generated_images",
            Stage::LazyHeaders => "lazy_headers",
            Stage::Attributes => "attributes",
            Stage::Video => "video",
            Stage::Emoji => "emoji",
        }
    }
}

/// Extension toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub expand_tabs: bool,
    pub tab_width: usize,
    pub generated_images: bool,
    pub lazy_headers: bool,
    pub attributes: bool,
    pub video: bool,
    pub emoji: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            expand_tabs: true,
            tab_width: DEFAULT_TAB_WIDTH,
            generated_images: true,
            lazy_headers: true,
            attributes: true,
            video: true,
            emoji: true,
        }
    }
}

impl TokenizerOptions {
    /// Plain CommonMark with every extension off
    pub fn commonmark() -> Self {
        Self {
            expand_tabs: false,
            tab_width: DEFAULT_TAB_WIDTH,
            generated_images: false,
            lazy_headers: false,
            attributes: false,
            video: false,
            emoji: false,
        }
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::ExpandTabs => self.expand_tabs,
            Stage::GeneratedImages => self.generated_images,
            Stage::LazyHeaders => self.lazy_headers,
            Stage::Attributes => self.attributes,
            Stage::Video => self.video,
            Stage::Emoji => self.emoji,
        }
    }
}

/// Markdown tokenizer
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    options: TokenizerOptions,
}

impl Tokenizer {
    pub fn new(options: TokenizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Tokenize a document. Never fails; unrecognized syntax stays text.
    pub fn parse(&self, markdown: &str) -> Vec<Token> {
        let mut text = markdown.replace("\r\n", "\n");
        for stage in Stage::SOURCE {
            if self.options.is_enabled(stage) {
                text = self.run_source_stage(stage, &text);
            }
        }

        let mut tokens = self.convert(&text);
        for stage in Stage::TOKENS {
            if self.options.is_enabled(stage) {
                tokens = self.run_token_stage(stage, tokens);
            }
        }

        debug!(tokens = tokens.len(), "Tokenized markdown");
        tokens
    }

    fn run_source_stage(&self, stage: Stage, text: &str) -> String {
        match stage {
            Stage::ExpandTabs => source::expand_tabs(text, self.options.tab_width),
            Stage::GeneratedImages => source::generated_image_fences(text),
            Stage::LazyHeaders => source::lazy_headers(text),
            _ => text.to_string(),
        }
    }

    fn run_token_stage(&self, stage: Stage, tokens: Vec<Token>) -> Vec<Token> {
        match stage {
            Stage::Attributes => attributes::apply(tokens),
            Stage::Video => stages::videos(tokens),
            Stage::Emoji => stages::emoji(tokens),
            _ => tokens,
        }
    }

    /// Flatten the pulldown-cmark event stream
    fn convert(&self, text: &str) -> Vec<Token> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let mut out = TokenSink::default();
        let mut stack: Vec<Frame> = Vec::new();

        for event in Parser::new_ext(text, options) {
            match event {
                Event::Start(tag) => {
                    let frame = match tag {
                        MdTag::Image {
                            dest_url, title, ..
                        } => Frame::Image {
                            url: dest_url.to_string(),
                            title: title.to_string(),
                            alt: String::new(),
                        },
                        MdTag::CodeBlock(kind) => Frame::CodeBlock {
                            info: match kind {
                                CodeBlockKind::Fenced(info) => Some(info.to_string()),
                                CodeBlockKind::Indented => None,
                            },
                            content: String::new(),
                        },
                        _ if image_alt(&mut stack).is_some() => Frame::Ignored,
                        other => match map_tag(other) {
                            Some(tag) => {
                                out.push(Token::open(tag.clone()));
                                Frame::Tag(tag)
                            }
                            None => Frame::Ignored,
                        },
                    };
                    stack.push(frame);
                }
                Event::End(_) => match stack.pop() {
                    Some(Frame::Tag(tag)) => out.push(Token::close(tag)),
                    Some(Frame::Image { url, title, alt }) => out.push(Token::Image {
                        url,
                        title,
                        alt,
                        attrs: Attributes::default(),
                    }),
                    Some(Frame::CodeBlock { info, content }) => {
                        out.push(self.code_block(info.as_deref(), content))
                    }
                    Some(Frame::Ignored) | None => {}
                },
                Event::Text(content) => {
                    if let Some(Frame::CodeBlock { content: body, .. }) = stack.last_mut() {
                        body.push_str(&content);
                    } else if let Some(alt) = image_alt(&mut stack) {
                        alt.push_str(&content);
                    } else {
                        out.push(Token::text(content.to_string()));
                    }
                }
                Event::Code(content) => match image_alt(&mut stack) {
                    Some(alt) => alt.push_str(&content),
                    None => out.push(Token::Code {
                        content: content.to_string(),
                        attrs: Attributes::default(),
                    }),
                },
                Event::Html(content) | Event::InlineHtml(content) => {
                    if image_alt(&mut stack).is_none() {
                        out.push(Token::Html {
                            content: content.to_string(),
                        });
                    }
                }
                Event::SoftBreak | Event::HardBreak if image_alt(&mut stack).is_some() => {
                    if let Some(alt) = image_alt(&mut stack) {
                        alt.push(' ');
                    }
                }
                Event::SoftBreak => out.push(Token::SoftBreak),
                Event::HardBreak => out.push(Token::HardBreak),
                Event::Rule => out.push(Token::Rule),
                _ => {}
            }
        }

        out.tokens
    }

    fn code_block(&self, info: Option<&str>, mut content: String) -> Token {
        let info = info.map(str::trim).unwrap_or_default();

        if self.options.generated_images {
            if let Some(params) = info.strip_prefix(GENERATED_IMAGE_SENTINEL) {
                return Token::GeneratedImage {
                    params: params.trim().to_string(),
                    content,
                };
            }
        }

        if content.ends_with('\n') {
            content.pop();
        }

        let (info, attrs) = match attributes_in_info(info, self.options.attributes) {
            Some((rest, attrs)) => (rest, attrs),
            None => (info, Attributes::default()),
        };
        let language = info
            .split_whitespace()
            .next()
            .map(str::to_string);

        Token::CodeBlock {
            language,
            content,
            attrs,
        }
    }
}

fn attributes_in_info(info: &str, enabled: bool) -> Option<(&str, Attributes)> {
    if !enabled {
        return None;
    }
    attributes::split_trailing(info)
}

/// Parser state for one open pulldown-cmark tag
enum Frame {
    Tag(Tag),
    Image {
        url: String,
        title: String,
        alt: String,
    },
    CodeBlock {
        info: Option<String>,
        content: String,
    },
    Ignored,
}

/// Alt text buffer of the innermost open image
fn image_alt(stack: &mut [Frame]) -> Option<&mut String> {
    stack.iter_mut().rev().find_map(|frame| match frame {
        Frame::Image { alt, .. } => Some(alt),
        _ => None,
    })
}

fn map_tag(tag: MdTag<'_>) -> Option<Tag> {
    let tag = match tag {
        MdTag::Paragraph => Tag::Paragraph,
        MdTag::Heading { level, .. } => Tag::Heading(level as u8),
        MdTag::BlockQuote(_) => Tag::BlockQuote,
        MdTag::List(start) => Tag::List { start },
        MdTag::Item => Tag::ListItem,
        MdTag::Table(_) => Tag::Table,
        MdTag::TableHead => Tag::TableHead,
        MdTag::TableRow => Tag::TableRow,
        MdTag::TableCell => Tag::TableCell,
        MdTag::Emphasis => Tag::Emphasis,
        MdTag::Strong => Tag::Strong,
        MdTag::Strikethrough => Tag::Strikethrough,
        MdTag::Link {
            dest_url, title, ..
        } => Tag::Link {
            url: dest_url.to_string(),
            title: title.to_string(),
        },
        _ => return None,
    };
    Some(tag)
}

/// Output buffer that merges adjacent text and adjacent HTML
#[derive(Default)]
struct TokenSink {
    tokens: Vec<Token>,
}

impl TokenSink {
    fn push(&mut self, token: Token) {
        match (self.tokens.last_mut(), token) {
            (Some(Token::Text { content }), Token::Text { content: more }) => {
                content.push_str(&more)
            }
            (Some(Token::Html { content }), Token::Html { content: more }) => {
                content.push_str(&more)
            }
            (_, token) => self.tokens.push(token),
        }
    }
}

/// Tokenize with the default extension set
pub fn parse(markdown: &str) -> Vec<Token> {
    Tokenizer::default().parse(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::VideoService;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().filter_map(Token::as_text).collect()
    }

    #[test]
    fn test_heading_and_paragraph() {
        let tokens = parse("# Title\n\nHello *world*");
        assert_eq!(tokens[0], Token::open(Tag::Heading(1)));
        assert_eq!(tokens[1], Token::text("Title"));
        assert_eq!(tokens[2], Token::close(Tag::Heading(1)));
        assert!(tokens.contains(&Token::open(Tag::Emphasis)));
        assert_eq!(texts(&tokens), vec!["Title", "Hello ", "world"]);
    }

    #[test]
    fn test_lazy_header_stage() {
        let tokens = parse("#Title");
        assert_eq!(tokens[0], Token::open(Tag::Heading(1)));

        let plain = Tokenizer::new(TokenizerOptions::commonmark()).parse("#Title");
        assert_eq!(plain[0], Token::open(Tag::Paragraph));
    }

    #[test]
    fn test_code_block_language_and_attributes() {
        let tokens = parse("```rust {.small}\nfn main() {}\n```");
        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::CodeBlock {
                language,
                content,
                attrs,
            } => {
                assert_eq!(language.as_deref(), Some("rust"));
                assert_eq!(content, "fn main() {}");
                assert!(attrs.has_class("small"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_generated_image_block() {
        let tokens = parse("$$$ chart\nplot(x)\n$$$\n\nafter");
        assert_eq!(
            tokens[0],
            Token::GeneratedImage {
                params: "chart".into(),
                content: "plot(x)\n".into()
            }
        );
        assert_eq!(texts(&tokens), vec!["after"]);
    }

    #[test]
    fn test_generated_image_inside_list() {
        let tokens = parse("- item\n\n  $$ plot\n  y = x\n  $$\n");
        let found = tokens.iter().any(|t| {
            matches!(t, Token::GeneratedImage { params, content } if params == "plot" && content == "y = x\n")
        });
        assert!(found, "{tokens:?}");
    }

    #[test]
    fn test_image_alt_and_attributes() {
        let tokens = parse("![The *alt*](bg.png \"Title\"){.background}");
        match &tokens[1] {
            Token::Image {
                url,
                title,
                alt,
                attrs,
            } => {
                assert_eq!(url, "bg.png");
                assert_eq!(title, "Title");
                assert_eq!(alt, "The alt");
                assert!(attrs.has_class("background"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_video_and_emoji_stages() {
        let tokens = parse("@[youtube](dQw4w9WgXcQ) :tada:");
        assert!(tokens.contains(&Token::Video {
            service: VideoService::Youtube,
            id: "dQw4w9WgXcQ".into()
        }));
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Emoji { shortcode, .. } if shortcode == "tada")));

        let plain = Tokenizer::new(TokenizerOptions {
            emoji: false,
            ..Default::default()
        })
        .parse(":tada:");
        assert_eq!(texts(&plain), vec![":tada:"]);
    }

    #[test]
    fn test_tables_and_strikethrough() {
        let tokens = parse("| a | b |\n|---|---|\n| ~~x~~ | y |");
        assert!(tokens.contains(&Token::open(Tag::Table)));
        assert!(tokens.contains(&Token::open(Tag::TableHead)));
        assert!(tokens.contains(&Token::open(Tag::Strikethrough)));
    }

    #[test]
    fn test_html_comment_is_kept() {
        let tokens = parse("text\n\n<!-- speaker notes -->\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Html { content } if content.contains("speaker notes"))));
    }

    #[test]
    fn test_tab_expansion_preserves_nesting() {
        let tokens = parse("- a\n\t- b\n");
        let lists = tokens
            .iter()
            .filter(|t| matches!(t, Token::Open { tag: Tag::List { .. }, .. }))
            .count();
        assert_eq!(lists, 2);
    }

    #[test]
    fn test_deterministic() {
        let source = "# A {.big}\n\n* one\n* two\n\n---\n\n## B\n";
        assert_eq!(parse(source), parse(source));
    }
}
