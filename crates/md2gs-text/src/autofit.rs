//! Auto-fit: choose the largest font size whose wrapped text fits a box.
//!
//! The search is a plain bisection over `[min_pt, max_pt]`. It stops once the
//! interval is narrower than the tolerance and returns the best size that
//! fit. When even the minimum does not fit, the minimum is returned and the
//! caller accepts the overflow.

use serde::{Deserialize, Serialize};

use crate::emu_to_points;
use crate::metrics::FontRegistry;

/// Default lower bound in points
pub const DEFAULT_MIN_PT: f64 = 8.0;

/// Default upper bound in points
pub const DEFAULT_MAX_PT: f64 = 48.0;

/// Default search tolerance in points
pub const DEFAULT_TOLERANCE_PT: f64 = 0.5;

/// A bounding box, width and height in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    /// Create a box from points
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a box from EMU
    pub fn from_emu(width: f64, height: f64) -> Self {
        Self {
            width: emu_to_points(width),
            height: emu_to_points(height),
        }
    }
}

/// Bounds for the font size search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoFit {
    pub min_pt: f64,
    pub max_pt: f64,
    pub tolerance: f64,
}

impl Default for AutoFit {
    fn default() -> Self {
        Self {
            min_pt: DEFAULT_MIN_PT,
            max_pt: DEFAULT_MAX_PT,
            tolerance: DEFAULT_TOLERANCE_PT,
        }
    }
}

impl AutoFit {
    /// Create search bounds with the default tolerance
    pub fn new(min_pt: f64, max_pt: f64) -> Self {
        Self {
            min_pt,
            max_pt,
            tolerance: DEFAULT_TOLERANCE_PT,
        }
    }

    /// Largest size in `[min_pt, max_pt]` at which `text` fits `bounds`
    pub fn fit(&self, registry: &FontRegistry, text: &str, bounds: BoxSize, family: &str) -> f64 {
        let metrics = registry.resolve(family);
        let tolerance = if self.tolerance > 0.0 {
            self.tolerance
        } else {
            DEFAULT_TOLERANCE_PT
        };

        let mut low = self.min_pt;
        let mut high = self.max_pt;
        let mut best = self.min_pt;

        // Inverted or NaN bounds: the minimum, capped by a usable maximum
        if !(high > low) {
            return best.min(self.max_pt);
        }

        while high - low > tolerance {
            let mid = (low + high) / 2.0;
            let measured = crate::measure::measure_wrapped_text(&metrics, text, mid, bounds.width);
            if measured.width <= bounds.width && measured.height <= bounds.height {
                best = mid;
                low = mid;
            } else {
                high = mid;
            }
        }

        best
    }
}

/// Estimate a font size for `text` in a box given in EMU
pub fn estimate_font_size(
    registry: &FontRegistry,
    text: &str,
    box_emu: BoxSize,
    max_pt: f64,
    min_pt: f64,
    family: &str,
) -> f64 {
    let bounds = BoxSize::from_emu(box_emu.width, box_emu.height);
    AutoFit::new(min_pt, max_pt).fit(registry, text, bounds, family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::measure_wrapped_text;

    const SAMPLE: &str = "Sample text for font size estimation";

    #[test]
    fn test_fits_repeated_text_in_box() {
        let registry = FontRegistry::new();
        let text = "hello world ".repeat(20);
        let box_emu = BoxSize::new(5_000_000.0, 2_000_000.0);
        let size = estimate_font_size(&registry, &text, box_emu, 48.0, 8.0, "Arial");

        let bounds = BoxSize::from_emu(box_emu.width, box_emu.height);
        let measured = registry.measure(&text, size, bounds.width, "Arial");
        assert!(measured.width <= bounds.width + 0.01);
        assert!(measured.height <= bounds.height + 0.01);
        assert!(size > 8.0 && size <= 48.0);
    }

    #[test]
    fn test_result_stays_in_range() {
        let registry = FontRegistry::new();
        let tiny = BoxSize::from_emu(100.0, 50.0);
        let huge = BoxSize::from_emu(100_000.0, 10_000.0);
        let fit = AutoFit::default();

        let tiny_size = fit.fit(&registry, SAMPLE, tiny, "Montserrat");
        let huge_size = fit.fit(&registry, "A", huge, "Montserrat");
        assert_eq!(tiny_size, 8.0);
        assert!(huge_size <= 48.0 && huge_size >= 8.0);
    }

    #[test]
    fn test_every_family_fits() {
        let registry = FontRegistry::new();
        let bounds = BoxSize::new(500.0, 120.0);
        for family in ["Arial", "Roboto", "Montserrat", "UnknownSerif"] {
            let size = AutoFit::default().fit(&registry, SAMPLE, bounds, family);
            assert!(size > 8.0 && size <= 48.0, "{family}: {size}");
            let measured = registry.measure(SAMPLE, size, bounds.width, family);
            assert!(measured.height <= bounds.height, "{family}");
            assert!(measured.width <= bounds.width, "{family}");
        }
    }

    #[test]
    fn test_growing_box_never_shrinks_size() {
        let registry = FontRegistry::new();
        let text = "Markdown to slides, fitted and wrapped";
        let fit = AutoFit::default();
        let mut previous = 0.0;
        for step in 1..=20 {
            let scale = step as f64 * 15.0;
            let size = fit.fit(&registry, text, BoxSize::new(scale * 2.0, scale), "Roboto");
            assert!(size >= previous, "step {step}: {size} < {previous}");
            previous = size;
        }
    }

    #[test]
    fn test_deterministic() {
        let registry = FontRegistry::new();
        let bounds = BoxSize::new(300.0, 80.0);
        let a = AutoFit::default().fit(&registry, SAMPLE, bounds, "Lato");
        let b = AutoFit::default().fit(&registry, SAMPLE, bounds, "Lato");
        assert_eq!(a, b);
    }

    #[test]
    fn test_inverted_or_invalid_bounds_stay_within_max() {
        let registry = FontRegistry::new();
        let bounds = BoxSize::new(300.0, 80.0);
        assert_eq!(AutoFit::new(20.0, 10.0).fit(&registry, SAMPLE, bounds, "Arial"), 10.0);
        assert_eq!(AutoFit::new(12.0, f64::NAN).fit(&registry, SAMPLE, bounds, "Arial"), 12.0);
    }

    #[test]
    fn test_zero_tolerance_still_terminates() {
        let registry = FontRegistry::new();
        let fit = AutoFit {
            min_pt: 8.0,
            max_pt: 48.0,
            tolerance: 0.0,
        };
        let size = fit.fit(&registry, SAMPLE, BoxSize::new(300.0, 80.0), "Arial");
        let metrics = registry.resolve("Arial");
        let measured = measure_wrapped_text(&metrics, SAMPLE, size, 300.0);
        assert!(measured.height <= 80.0);
    }
}
