//! Approximate text measurement.
//!
//! Wrapping uses the family's average glyph width rather than per-glyph
//! shaping. The result only feeds a fit/no-fit decision, so an estimate that
//! errs consistently is good enough.

use serde::{Deserialize, Serialize};

use crate::constants::LINE_SEPARATOR;
use crate::metrics::FontMetrics;

/// Size of a block of wrapped text, in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasuredText {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

/// Measure `text` wrapped into a box `box_width` points wide.
///
/// Paragraphs are split on newlines and on the line separator. Blank
/// paragraphs still occupy one line. Words are never broken: a word wider
/// than the box sits on a line of its own.
pub fn measure_wrapped_text(
    metrics: &FontMetrics,
    text: &str,
    font_size: f64,
    box_width: f64,
) -> MeasuredText {
    let line_height = metrics.line_height(font_size);
    let space_width = metrics.char_width(1, font_size);
    let mut line_count = 0;
    let mut max_width: f64 = 0.0;

    for paragraph in text.split(|c| c == '\n' || c == LINE_SEPARATOR) {
        if paragraph.trim().is_empty() {
            line_count += 1;
            continue;
        }

        let mut line_width = 0.0;
        for word in paragraph.split(' ') {
            let word_width = metrics.char_width(word.chars().count(), font_size) + space_width;
            if line_width + word_width > box_width && line_width > 0.0 {
                max_width = max_width.max(line_width);
                line_count += 1;
                line_width = word_width;
            } else {
                line_width += word_width;
            }
        }
        max_width = max_width.max(line_width);
        line_count += 1;
    }

    MeasuredText {
        width: max_width,
        height: line_count as f64 * line_height,
        line_count,
    }
}
