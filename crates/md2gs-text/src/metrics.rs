//! Font metrics registry.
//!
//! Resolution never fails. A family name is looked up in this order:
//!
//! 1. Exact match against the core families and anything already cached
//! 2. Normalized-name match (case, spaces and hyphens ignored) against the
//!    built-in catalog
//! 3. A heuristic fallback family picked by keyword
//! 4. Metrics synthesized by sampling glyph advances over a probe string
//!
//! The registry is owned by a compilation session. Its cache sits behind a
//! read/write lock; two threads resolving the same family may both insert,
//! which is harmless because the inserted values are identical.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TextError};
use crate::measure::{measure_wrapped_text, MeasuredText};

/// Default fallback family for names that give no hint
pub const DEFAULT_FALLBACK_FAMILY: &str = "Arial";

/// Fallback family for names that look like a modern sans-serif
pub const SANS_FALLBACK_FAMILY: &str = "Roboto";

/// Keywords that route an unknown family to the sans fallback
const SANS_SERIF_KEYWORDS: &[&str] = &["helvetica", "roboto", "montserrat", "open sans", "lato", "sans"];

/// Probe string used when metrics have to be synthesized from glyph advances
const PROBE_TEXT: &str = "the quick brown fox jumps over the lazy dog";

/// Nominal size (in font units per em) used for sampling
const PROBE_SIZE: f32 = 1000.0;

/// Vertical and horizontal metrics of one font family, in font units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub ascent: f64,
    /// Usually negative
    pub descent: f64,
    pub line_gap: f64,
    pub units_per_em: f64,
    /// Average advance of a lowercase glyph
    pub average_char_width: f64,
}

impl FontMetrics {
    /// Create metrics from raw font units
    pub const fn new(
        ascent: f64,
        descent: f64,
        line_gap: f64,
        units_per_em: f64,
        average_char_width: f64,
    ) -> Self {
        Self {
            ascent,
            descent,
            line_gap,
            units_per_em,
            average_char_width,
        }
    }

    /// Scale factor from font units to points at `font_size`
    pub fn scale(&self, font_size: f64) -> f64 {
        font_size / self.units_per_em
    }

    /// Width of `char_count` average glyphs at `font_size` points
    pub fn char_width(&self, char_count: usize, font_size: f64) -> f64 {
        char_count as f64 * self.average_char_width * self.scale(font_size)
    }

    /// Height of one line at `font_size` points
    pub fn line_height(&self, font_size: f64) -> f64 {
        (self.ascent - self.descent + self.line_gap) * self.scale(font_size)
    }
}

/// Families matched by exact name before any normalization
const CORE_FAMILIES: &[(&str, FontMetrics)] = &[
    ("Arial", FontMetrics::new(1854.0, -434.0, 67.0, 2048.0, 904.0)),
    ("Roboto", FontMetrics::new(1900.0, -500.0, 0.0, 2048.0, 911.0)),
    ("Montserrat", FontMetrics::new(968.0, -251.0, 0.0, 1000.0, 507.0)),
];

/// Larger catalog matched by normalized name
const CATALOG: &[(&str, FontMetrics)] = &[
    ("arial", FontMetrics::new(1854.0, -434.0, 67.0, 2048.0, 904.0)),
    ("roboto", FontMetrics::new(1900.0, -500.0, 0.0, 2048.0, 911.0)),
    ("montserrat", FontMetrics::new(968.0, -251.0, 0.0, 1000.0, 507.0)),
    ("helvetica", FontMetrics::new(1577.0, -471.0, 0.0, 2048.0, 883.0)),
    ("helveticaneue", FontMetrics::new(952.0, -213.0, 28.0, 1000.0, 450.0)),
    ("timesnewroman", FontMetrics::new(1825.0, -443.0, 87.0, 2048.0, 819.0)),
    ("georgia", FontMetrics::new(1878.0, -449.0, 0.0, 2048.0, 913.0)),
    ("verdana", FontMetrics::new(2059.0, -430.0, 0.0, 2048.0, 1102.0)),
    ("tahoma", FontMetrics::new(2049.0, -423.0, 0.0, 2048.0, 979.0)),
    ("trebuchetms", FontMetrics::new(1923.0, -455.0, 0.0, 2048.0, 920.0)),
    ("couriernew", FontMetrics::new(1705.0, -615.0, 0.0, 2048.0, 1229.0)),
    ("calibri", FontMetrics::new(1536.0, -512.0, 452.0, 2048.0, 858.0)),
    ("cambria", FontMetrics::new(1946.0, -455.0, 0.0, 2048.0, 890.0)),
    ("segoeui", FontMetrics::new(2210.0, -514.0, 0.0, 2048.0, 919.0)),
    ("comicsansms", FontMetrics::new(2257.0, -597.0, 0.0, 2048.0, 981.0)),
    ("impact", FontMetrics::new(2066.0, -432.0, 41.0, 2048.0, 944.0)),
    ("opensans", FontMetrics::new(2189.0, -600.0, 0.0, 2048.0, 1085.0)),
    ("lato", FontMetrics::new(1974.0, -426.0, 0.0, 2000.0, 927.0)),
    ("sourcesanspro", FontMetrics::new(984.0, -273.0, 0.0, 1000.0, 461.0)),
    ("notosans", FontMetrics::new(1069.0, -293.0, 0.0, 1000.0, 539.0)),
    ("poppins", FontMetrics::new(1050.0, -350.0, 100.0, 1000.0, 548.0)),
    ("inter", FontMetrics::new(2728.0, -680.0, 0.0, 2816.0, 1340.0)),
    ("raleway", FontMetrics::new(940.0, -234.0, 0.0, 1000.0, 497.0)),
    ("oswald", FontMetrics::new(1193.0, -289.0, 0.0, 1000.0, 395.0)),
    ("nunito", FontMetrics::new(1011.0, -353.0, 0.0, 1000.0, 487.0)),
    ("merriweather", FontMetrics::new(984.0, -273.0, 0.0, 1000.0, 562.0)),
    ("playfairdisplay", FontMetrics::new(1082.0, -251.0, 0.0, 1000.0, 493.0)),
    ("ptsans", FontMetrics::new(1018.0, -276.0, 0.0, 1000.0, 476.0)),
    ("ubuntu", FontMetrics::new(932.0, -189.0, 28.0, 1000.0, 487.0)),
    ("firasans", FontMetrics::new(935.0, -265.0, 0.0, 1000.0, 496.0)),
    ("lora", FontMetrics::new(1006.0, -274.0, 0.0, 1000.0, 506.0)),
    ("worksans", FontMetrics::new(930.0, -243.0, 0.0, 1000.0, 525.0)),
    ("quicksand", FontMetrics::new(1000.0, -250.0, 0.0, 1000.0, 494.0)),
    ("karla", FontMetrics::new(918.0, -264.0, 0.0, 1000.0, 478.0)),
    ("robotomono", FontMetrics::new(2146.0, -555.0, 0.0, 2048.0, 1229.0)),
    ("sourcecodepro", FontMetrics::new(984.0, -273.0, 0.0, 1000.0, 600.0)),
];

/// Advance widths (per 1000 units) of a neutral grotesque, used as the
/// glyph source of last resort
fn builtin_advance(ch: char) -> f64 {
    match ch {
        ' ' | 'f' | 't' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        'r' => 333.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500.0,
        'm' => 833.0,
        'w' => 722.0,
        _ => 556.0,
    }
}

fn normalize_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup_core(family: &str) -> Option<FontMetrics> {
    CORE_FAMILIES
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, metrics)| *metrics)
}

fn lookup_catalog(family: &str) -> Option<FontMetrics> {
    let key = normalize_family(family);
    if key.is_empty() {
        return None;
    }
    CATALOG
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, metrics)| *metrics)
}

/// Average the advances of the probe string and combine with vertical metrics
fn sample_metrics(
    advance: impl Fn(char) -> f64,
    ascent: f64,
    descent: f64,
    line_gap: f64,
) -> FontMetrics {
    let count = PROBE_TEXT.chars().count() as f64;
    let total: f64 = PROBE_TEXT.chars().map(advance).sum();
    FontMetrics::new(ascent, descent, line_gap, f64::from(PROBE_SIZE), total / count)
}

/// Registry of resolved font metrics for one compilation session
#[derive(Debug)]
pub struct FontRegistry {
    cache: RwLock<HashMap<String, FontMetrics>>,
    default_family: String,
    sans_family: String,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// Create a registry with the standard fallback families
    pub fn new() -> Self {
        Self::with_fallbacks(DEFAULT_FALLBACK_FAMILY, SANS_FALLBACK_FAMILY)
    }

    /// Create a registry with custom fallback families
    pub fn with_fallbacks(default_family: impl Into<String>, sans_family: impl Into<String>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            default_family: default_family.into(),
            sans_family: sans_family.into(),
        }
    }

    /// Family used when nothing else matches
    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Resolve a family name to metrics. Never fails.
    pub fn resolve(&self, family: &str) -> FontMetrics {
        if family.trim().is_empty() {
            return self.resolve_fallback(&self.default_family);
        }

        if let Some(metrics) = self.cache.read().get(family) {
            return *metrics;
        }

        let resolved = lookup_core(family).or_else(|| lookup_catalog(family));
        let metrics = match resolved {
            Some(metrics) => metrics,
            None => {
                let fallback = self.fallback_family(family);
                warn!("Font metrics not found for '{}', using {}", family, fallback);
                self.resolve_fallback(fallback)
            }
        };

        self.cache.write().insert(family.to_string(), metrics);
        metrics
    }

    /// Register explicit metrics for a family, replacing any cached entry
    pub fn register_metrics(&self, family: impl Into<String>, metrics: FontMetrics) {
        self.cache.write().insert(family.into(), metrics);
    }

    /// Register a font file for a family by sampling its glyph advances
    pub fn register_font_data(&self, family: &str, data: &[u8]) -> Result<FontMetrics> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|reason| TextError::invalid_font(family, reason))?;
        let lines = font
            .horizontal_line_metrics(PROBE_SIZE)
            .ok_or_else(|| TextError::MissingLineMetrics {
                family: family.to_string(),
            })?;

        let metrics = sample_metrics(
            |ch| f64::from(font.metrics(ch, PROBE_SIZE).advance_width),
            f64::from(lines.ascent),
            f64::from(lines.descent),
            f64::from(lines.line_gap),
        );
        debug!("Registered font data for '{}': {:?}", family, metrics);
        self.register_metrics(family, metrics);
        Ok(metrics)
    }

    /// Measure wrapped text in the given family
    pub fn measure(&self, text: &str, font_size: f64, box_width: f64, family: &str) -> MeasuredText {
        measure_wrapped_text(&self.resolve(family), text, font_size, box_width)
    }

    /// Pick the fallback family for an unknown name
    pub fn fallback_family(&self, family: &str) -> &str {
        let lower = family.to_lowercase();
        if SANS_SERIF_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            &self.sans_family
        } else {
            &self.default_family
        }
    }

    /// Resolve a fallback family without applying heuristics again
    fn resolve_fallback(&self, family: &str) -> FontMetrics {
        if let Some(metrics) = self.cache.read().get(family) {
            return *metrics;
        }
        lookup_core(family)
            .or_else(|| lookup_catalog(family))
            .unwrap_or_else(|| {
                warn!("Fallback family '{}' is unknown, synthesizing metrics", family);
                sample_metrics(builtin_advance, 718.0, -207.0, 33.0)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_families_load() {
        let registry = FontRegistry::new();
        for family in ["Arial", "Roboto", "Montserrat"] {
            let metrics = registry.resolve(family);
            assert!(metrics.units_per_em > 0.0, "{family}");
            assert!(metrics.average_char_width > 0.0, "{family}");
            assert!(metrics.ascent > 0.0 && metrics.descent < 0.0, "{family}");
        }
    }

    #[test]
    fn test_name_variations_match_catalog() {
        let registry = FontRegistry::new();
        let base = registry.resolve("Montserrat");
        for variation in ["montserrat", "MONTSERRAT", " Montserrat "] {
            assert_eq!(registry.resolve(variation), base, "{variation}");
        }
        assert_eq!(
            registry.resolve("open-sans"),
            registry.resolve("Open Sans")
        );
    }

    #[test]
    fn test_unknown_sans_uses_sans_fallback() {
        let registry = FontRegistry::new();
        assert_eq!(registry.resolve("UnknownSansSerif"), registry.resolve("Roboto"));
        assert_eq!(registry.resolve("Helvetica Rounded"), registry.resolve("Roboto"));
    }

    #[test]
    fn test_unknown_serif_uses_default_fallback() {
        let registry = FontRegistry::new();
        assert_eq!(registry.resolve("UnknownSerif"), registry.resolve("Arial"));
    }

    #[test]
    fn test_blank_name_resolves_to_default() {
        let registry = FontRegistry::new();
        assert_eq!(registry.resolve(""), registry.resolve("Arial"));
        assert_eq!(registry.resolve("   "), registry.resolve("Arial"));
        // Blank names are not cached
        assert!(!registry.cache.read().contains_key(""));
    }

    #[test]
    fn test_resolution_is_cached_under_exact_name() {
        let registry = FontRegistry::new();
        registry.resolve("LATO");
        assert!(registry.cache.read().contains_key("LATO"));
        assert!(!registry.cache.read().contains_key("Lato"));
    }

    #[test]
    fn test_unknown_fallback_family_is_synthesized() {
        let registry = FontRegistry::with_fallbacks("Corporate Serif", "Corporate Sans");
        let metrics = registry.resolve("Mystery");
        assert_eq!(metrics.units_per_em, 1000.0);
        assert!(metrics.average_char_width > 300.0 && metrics.average_char_width < 600.0);
        assert!(metrics.line_height(10.0) > 0.0);
    }

    #[test]
    fn test_registered_metrics_take_precedence() {
        let registry = FontRegistry::new();
        let custom = FontMetrics::new(800.0, -200.0, 0.0, 1000.0, 500.0);
        registry.register_metrics("Brand Sans", custom);
        assert_eq!(registry.resolve("Brand Sans"), custom);
    }

    #[test]
    fn test_invalid_font_data_is_rejected() {
        let registry = FontRegistry::new();
        let err = registry
            .register_font_data("Broken", b"not a font")
            .unwrap_err();
        assert_eq!(err.code(), "TEXT001");
    }

    #[test]
    fn test_concurrent_resolution() {
        let registry = FontRegistry::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for family in ["Arial", "Lato", "Nope Sans", "Georgia"] {
                        registry.resolve(family);
                    }
                });
            }
        });
        assert_eq!(registry.resolve("Nope Sans"), registry.resolve("Roboto"));
    }

    #[test]
    fn test_line_height_scales_with_size() {
        let metrics = FontRegistry::new().resolve("Arial");
        let small = metrics.line_height(10.0);
        let large = metrics.line_height(20.0);
        assert!((large - 2.0 * small).abs() < 1e-9);
    }
}
