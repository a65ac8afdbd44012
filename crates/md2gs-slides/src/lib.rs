//! # md2gs-slides
//!
//! Slide decks compiled from Markdown and synchronised with a remote
//! presentation service.
//!
//! ## Pipeline
//!
//! 1. [`DeckCompiler`] turns Markdown into a [`Deck`] of [`SlideDefinition`]s,
//!    choosing a layout per slide and auto-fitting every text block
//! 2. [`SlideRenderer`] turns slides into batch update [`Request`]s
//! 3. [`reconcile`] applies them through a [`PresentationClient`], keeping a
//!    hidden position marker in each slide's speaker notes
//!
//! ## Example
//!
//! ```
//! use md2gs_slides::{compile, DeckConfig, SlideLayout};
//!
//! let deck = compile("# Hello {.big}\n\n---\n\n# Agenda\n\n* One\n* Two", &DeckConfig::default())
//!     .unwrap();
//! assert_eq!(deck.len(), 2);
//! assert_eq!(deck.slides[0].layout, SlideLayout::MainPoint);
//! assert_eq!(deck.slides[1].layout, SlideLayout::TitleAndBody);
//! ```

pub mod client;
pub mod compiler;
pub mod config;
pub mod error;
pub mod layout;
pub mod meta;
pub mod reconcile;
pub mod render;
pub mod slide;
pub mod wire;

// Re-exports
pub use client::PresentationClient;
pub use compiler::{compile, DeckCompiler};
pub use config::DeckConfig;
pub use error::{Result, SlidesError};
pub use layout::{match_layout, LayoutResolver, Rect};
pub use meta::{MarkerState, PresentationMeta, SlideMeta, MARKER_PREFIX};
pub use reconcile::{copy_slide, edit_slide, ensure_markers, push_deck, ElementUpdate, PushReport};
pub use render::{ObjectIds, RenderedSlide, SlideRenderer};
pub use slide::{BodyDefinition, Deck, ImageDefinition, PlaceholderRole, SlideDefinition, SlideLayout};
pub use wire::{BatchUpdateResponse, Presentation, Request};
