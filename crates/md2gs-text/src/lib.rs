//! # md2gs-text
//!
//! Text geometry for slide compilation.
//!
//! This crate holds everything needed to decide how large a piece of text
//! can be drawn inside a placeholder box, independent of any rendering target:
//!
//! - **Font metrics**: [`FontRegistry`] resolves a family name to
//!   [`FontMetrics`] through a fallback chain that never fails
//! - **Measurement**: greedy word wrapping with average glyph widths
//! - **Auto-fit**: bisection over font sizes until the wrapped text fits
//! - **Styled text**: [`TextBlock`] with ranged [`StyleRun`] annotations
//!
//! ## Example
//!
//! ```
//! use md2gs_text::{AutoFit, BoxSize, FontRegistry};
//!
//! let registry = FontRegistry::new();
//! let size = AutoFit::default().fit(
//!     &registry,
//!     "Quarterly results",
//!     BoxSize::new(400.0, 60.0),
//!     "Arial",
//! );
//! assert!((8.0..=48.0).contains(&size));
//! ```

pub mod autofit;
pub mod error;
pub mod measure;
pub mod metrics;
pub mod style;

// Re-exports
pub use autofit::{estimate_font_size, AutoFit, BoxSize};
pub use error::{Result, TextError};
pub use measure::{measure_wrapped_text, MeasuredText};
pub use metrics::{FontMetrics, FontRegistry};
pub use style::{
    FontSize, FontUnit, ListKind, ListMarker, RgbColor, StyleRun, TextBlock, TextBuilder,
    TextStyle,
};

/// Geometry and text constants shared with the remote presentation API
pub mod constants {
    /// EMU per point
    pub const EMU_PER_POINT: f64 = 12_700.0;

    /// EMU per inch
    pub const EMU_PER_INCH: f64 = 914_400.0;

    /// Line separator that breaks a line without starting a new paragraph
    pub const LINE_SEPARATOR: char = '\u{000b}';

    /// Default slide width in EMU (10" wide, 16:9)
    pub const DEFAULT_PAGE_WIDTH_EMU: f64 = 9_144_000.0;

    /// Default slide height in EMU (5.625" high, 16:9)
    pub const DEFAULT_PAGE_HEIGHT_EMU: f64 = 5_143_500.0;
}

/// Convert EMU to points
pub fn emu_to_points(emu: f64) -> f64 {
    emu / constants::EMU_PER_POINT
}

/// Convert points to EMU
pub fn points_to_emu(points: f64) -> f64 {
    points * constants::EMU_PER_POINT
}

/// Length of a string in UTF-16 code units, the indexing unit used by run offsets
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
