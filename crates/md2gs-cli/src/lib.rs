//! md2gs CLI - Command-line interface library
//!
//! - Compile: Markdown to a JSON deck, offline
//! - Push: append a deck to a presentation, with markers and notes
//! - Markers / Copy-slide / Edit: reconciliation primitives
//!
//! # Binary Usage
//!
//! ```bash
//! # Inspect what a deck compiles to
//! md2gs compile talk.md --output talk.json
//!
//! # Replace a presentation's slides
//! MD2GS_ACCESS_TOKEN=... md2gs push talk.md --presentation 1AbC --erase
//!
//! # Mark slides and dump their metadata
//! md2gs markers 1AbC --token ...
//! ```

pub mod app;
pub mod client;

// Re-export main entry point and types
pub use app::{
    compile_command, copy_slide_command, edit_command, init_logging, load_config,
    markers_command, push_command, run_cli,
};
pub use client::{SlidesClient, DEFAULT_API_URL};
