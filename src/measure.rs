//! Measurement provider traits, fallback measurers, and the per-pass cache.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::style::{ComputedStyle, FontStyle};

/// Measured extent of a text run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Font metrics for a style, before stroke inflation and scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance from baseline to the top of the tallest glyph.
    pub ascent: f32,
    /// Distance from baseline to the bottom of the lowest glyph.
    pub descent: f32,
    /// Nominal font size the metrics were produced for.
    pub font_size: f32,
}

/// Intrinsic dimensions of a resolved sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpriteSize {
    pub width: f32,
    pub height: f32,
}

/// External text measurement hook.
///
/// Implementations must be deterministic for a given `(text, style)` pair
/// within one process and side-effect-free from the engine's perspective.
/// Letter spacing and scale factors are applied by the engine after
/// measurement; implementations measure the raw glyph run only.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered extent of `text` under `style`.
    fn measure(&self, text: &str, style: &ComputedStyle) -> Size;

    /// Font metrics for `style`.
    fn measure_font(&self, style: &ComputedStyle) -> FontMetrics;
}

/// External sprite dimension resolver for image-styled tags.
pub trait SpriteProvider: Send + Sync {
    /// Intrinsic size for `key`, or `None` when the key resolves to nothing.
    fn resolve(&self, key: &str) -> Option<SpriteSize>;
}

/// Backend-free width model using per-glyph class widths.
///
/// Good enough for headless layout and previews; swap in a glyph-accurate
/// [`TextMeasurer`] for production rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, style: &ComputedStyle) -> Size {
        let metrics = self.measure_font(style);
        let height = metrics.ascent + metrics.descent;
        if text.is_empty() {
            return Size { width: 0.0, height };
        }
        let family = style.font_family.to_ascii_lowercase();
        let proportional = !(family.contains("mono") || family.contains("fixed"));
        let mut em_sum = 0.0f32;
        if proportional {
            for ch in text.chars() {
                em_sum += proportional_glyph_em_width(ch);
            }
        } else {
            for ch in text.chars() {
                em_sum += if ch == ' ' { 0.52 } else { 0.58 };
            }
        }
        let mut family_scale = if family.contains("serif") && !family.contains("sans") {
            1.03
        } else {
            1.00
        };
        if style.font_weight >= 700 {
            family_scale += 0.03;
        }
        if style.font_style != FontStyle::Normal {
            family_scale += 0.01;
        }
        Size {
            width: em_sum * style.font_size * family_scale,
            height,
        }
    }

    fn measure_font(&self, style: &ComputedStyle) -> FontMetrics {
        FontMetrics {
            ascent: style.font_size * 0.78,
            descent: style.font_size * 0.22,
            font_size: style.font_size,
        }
    }
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}

/// Fixed-advance measurer: every character is `char_width` wide and metrics
/// are constant regardless of style. Deterministic layout for tests and
/// monospace backends.
#[derive(Clone, Copy, Debug)]
pub struct FixedTextMeasurer {
    pub char_width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl FixedTextMeasurer {
    pub fn new(char_width: f32) -> Self {
        Self {
            char_width,
            ascent: 12.0,
            descent: 4.0,
        }
    }
}

impl TextMeasurer for FixedTextMeasurer {
    fn measure(&self, text: &str, _style: &ComputedStyle) -> Size {
        Size {
            width: text.chars().count() as f32 * self.char_width,
            height: self.ascent + self.descent,
        }
    }

    fn measure_font(&self, _style: &ComputedStyle) -> FontMetrics {
        FontMetrics {
            ascent: self.ascent,
            descent: self.descent,
            font_size: self.ascent + self.descent,
        }
    }
}

/// Per-pass memoization of provider calls keyed by text plus the style fields
/// that affect raw measurement. Repeated runs (icons, repeated words) hit the
/// cache instead of the provider.
#[derive(Default)]
pub(crate) struct MeasureCache {
    text: HashMap<(String, u64), Size>,
    fonts: HashMap<u64, FontMetrics>,
}

impl MeasureCache {
    pub(crate) fn measure(
        &mut self,
        measurer: &dyn TextMeasurer,
        text: &str,
        style: &ComputedStyle,
    ) -> Size {
        let key = (text.to_string(), measure_fingerprint(style));
        if let Some(hit) = self.text.get(&key) {
            return *hit;
        }
        let size = measurer.measure(text, style);
        self.text.insert(key, size);
        size
    }

    pub(crate) fn measure_font(
        &mut self,
        measurer: &dyn TextMeasurer,
        style: &ComputedStyle,
    ) -> FontMetrics {
        let key = measure_fingerprint(style);
        if let Some(hit) = self.fonts.get(&key) {
            return *hit;
        }
        let metrics = measurer.measure_font(style);
        self.fonts.insert(key, metrics);
        metrics
    }
}

/// Hash of the style fields raw measurement depends on. Letter spacing,
/// scale factors, and stroke are engine-applied and deliberately excluded.
fn measure_fingerprint(style: &ComputedStyle) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    style.font_family.hash(&mut hasher);
    style.font_size.to_bits().hash(&mut hasher);
    style.font_weight.hash(&mut hasher);
    (style.font_style as u8).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    #[test]
    fn heuristic_width_grows_with_size_and_weight() {
        let measurer = HeuristicTextMeasurer;
        let small = TextStyle {
            font_size: Some(12.0),
            ..TextStyle::default()
        }
        .computed();
        let large = TextStyle {
            font_size: Some(24.0),
            ..TextStyle::default()
        }
        .computed();
        let bold = TextStyle {
            font_size: Some(12.0),
            font_weight: Some(700),
            ..TextStyle::default()
        }
        .computed();
        let word = "measure";
        assert!(measurer.measure(word, &large).width > measurer.measure(word, &small).width);
        assert!(measurer.measure(word, &bold).width > measurer.measure(word, &small).width);
    }

    #[test]
    fn fixed_measurer_is_strictly_proportional() {
        let measurer = FixedTextMeasurer::new(7.0);
        let style = ComputedStyle::default();
        assert_eq!(measurer.measure("abcd", &style).width, 28.0);
        assert_eq!(measurer.measure("", &style).width, 0.0);
    }

    #[test]
    fn cache_returns_identical_results() {
        let measurer = HeuristicTextMeasurer;
        let style = ComputedStyle::default();
        let mut cache = MeasureCache::default();
        let first = cache.measure(&measurer, "hello", &style);
        let second = cache.measure(&measurer, "hello", &style);
        assert_eq!(first, second);
        assert_eq!(cache.text.len(), 1);
    }

    #[test]
    fn fingerprint_separates_sizes_not_spacing() {
        let a = TextStyle {
            font_size: Some(16.0),
            letter_spacing: Some(4.0),
            ..TextStyle::default()
        }
        .computed();
        let b = TextStyle {
            font_size: Some(16.0),
            ..TextStyle::default()
        }
        .computed();
        let c = TextStyle {
            font_size: Some(17.0),
            ..TextStyle::default()
        }
        .computed();
        assert_eq!(measure_fingerprint(&a), measure_fingerprint(&b));
        assert_ne!(measure_fingerprint(&a), measure_fingerprint(&c));
    }
}
