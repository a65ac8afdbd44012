//! # md2gs-markdown
//!
//! Markdown front end for md2gs.
//!
//! The tokenizer runs CommonMark (with tables and strikethrough) plus a
//! fixed set of slide-oriented extensions:
//!
//! - Tab expansion and lazy `#Heading` lines
//! - `$`-fenced generated-image blocks
//! - `{#id .class key=value}` attributes
//! - `@[youtube](id)` style video embeds
//! - `:shortcode:` emoji
//!
//! Code blocks are turned into styled runs by the [`Highlighter`].
//!
//! ## Example
//!
//! ```
//! use md2gs_markdown::{parse, Tag, Token};
//!
//! let tokens = parse("#Welcome {.big}\n\nHello :wave:");
//! assert!(matches!(
//!     &tokens[0],
//!     Token::Open { tag: Tag::Heading(1), attrs } if attrs.has_class("big")
//! ));
//! ```

pub mod attributes;
pub mod css;
pub mod highlight;
pub mod source;
pub mod stages;
pub mod token;
pub mod tokenizer;

// Re-exports
pub use css::Stylesheet;
pub use highlight::{HighlightNode, Highlighter};
pub use token::{Attributes, Tag, Token, VideoService};
pub use tokenizer::{parse, Stage, Tokenizer, TokenizerOptions};
