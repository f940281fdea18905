//! Greedy word-wrap line breaking over measured atomic units.

use std::collections::VecDeque;

use crate::error::LayoutError;
use crate::measure::{FontMetrics, MeasureCache, SpriteProvider, TextMeasurer};
use crate::split::{AtomicUnit, UnitContent};
use crate::style::{ImageDisplay, TextTransform};

/// An atomic unit with its measured extent and, after alignment, a position.
#[derive(Clone, Debug)]
pub(crate) struct MeasuredUnit {
    pub unit: AtomicUnit,
    /// Transform-applied string the backend should draw; empty for images
    /// and line breaks. The logical text stays on `unit`.
    pub presentation: String,
    /// Effective advance width. Zero for line breaks and collapsed spaces.
    pub width: f32,
    /// Effective height: stroke-inflated, scale-applied ascent+descent for
    /// text, sprite height for images.
    pub height: f32,
    /// Stroke-inflated, scale-applied metrics.
    pub metrics: FontMetrics,
    /// Trailing whitespace collapsed to zero width at end of line.
    pub collapsed: bool,
    pub x: f32,
    pub y: f32,
}

impl MeasuredUnit {
    /// Rise above the baseline used for line metrics: images sit on the
    /// baseline, so their full height counts as ascent.
    pub fn effective_ascent(&self) -> f32 {
        if self.unit.is_image() {
            self.height
        } else {
            self.metrics.ascent
        }
    }
}

/// One line of measured units, widths logical, not yet positioned.
#[derive(Clone, Debug, Default)]
pub(crate) struct UnitLine {
    pub units: Vec<MeasuredUnit>,
    /// Line ended with a forced break (line-break tag or block image).
    pub hard_break: bool,
    /// Forced break came from the line-break tag specifically.
    pub paragraph_break: bool,
    /// Extra vertical offset applied once after this line.
    pub paragraph_spacing_after: f32,
}

/// Greedy line breaker with a per-pass measurement cache.
pub(crate) struct LineBreaker<'a> {
    measurer: &'a dyn TextMeasurer,
    sprites: Option<&'a dyn SpriteProvider>,
    scale_icons: bool,
    cache: MeasureCache,
}

impl<'a> LineBreaker<'a> {
    pub fn new(
        measurer: &'a dyn TextMeasurer,
        sprites: Option<&'a dyn SpriteProvider>,
        scale_icons: bool,
    ) -> Self {
        Self {
            measurer,
            sprites,
            scale_icons,
            cache: MeasureCache::default(),
        }
    }

    /// Partition units into lines.
    ///
    /// One pass, maintaining the remaining width of the open line. A wrap
    /// never fires on the first anchoring unit of a line, so a single long
    /// first word overflows rather than producing an empty line. A wrap
    /// width that is absent, zero, negative, or NaN disables wrapping.
    pub fn break_units(
        &mut self,
        units: Vec<AtomicUnit>,
        wrap_width: f32,
        word_wrap: bool,
    ) -> Result<Vec<UnitLine>, LayoutError> {
        let bounded = word_wrap && wrap_width.is_finite() && wrap_width > 0.0;
        let mut lines: Vec<UnitLine> = Vec::with_capacity(4);
        let mut current = UnitLine::default();
        let mut remaining = wrap_width;
        let mut queue: VecDeque<AtomicUnit> = units.into_iter().collect();

        while let Some(unit) = queue.pop_front() {
            if unit.is_line_break() {
                let spacing = unit.style.paragraph_spacing;
                current.units.push(self.measure_unit(unit)?);
                current.hard_break = true;
                current.paragraph_break = true;
                current.paragraph_spacing_after = spacing;
                lines.push(core::mem::take(&mut current));
                remaining = wrap_width;
                continue;
            }

            let measured = self.measure_unit(unit)?;
            let block_image = measured.unit.is_image()
                && measured.unit.style.img_display == ImageDisplay::Block;

            if bounded && !block_image {
                if measured.width > wrap_width
                    && measured.unit.style.break_words
                    && !measured.unit.is_image()
                    && measured.unit.text().chars().count() > 1
                {
                    // Too wide for any line: re-queue as characters so the
                    // run can break mid-word.
                    let AtomicUnit {
                        content,
                        tag_path,
                        style,
                    } = measured.unit;
                    if let UnitContent::Text(text) = content {
                        for ch in text.chars().rev() {
                            queue.push_front(AtomicUnit {
                                content: UnitContent::Text(ch.to_string()),
                                tag_path: tag_path.clone(),
                                style: style.clone(),
                            });
                        }
                    }
                    continue;
                }
                // Whitespace never wraps by itself; it overflows the line and
                // collapses there instead of opening the next line.
                if measured.width > remaining
                    && !measured.unit.is_whitespace()
                    && line_has_anchor(&current)
                {
                    lines.push(core::mem::take(&mut current));
                    remaining = wrap_width;
                }
            }

            remaining -= measured.width;
            current.units.push(measured);
            if block_image {
                current.hard_break = true;
                lines.push(core::mem::take(&mut current));
                remaining = wrap_width;
            }
        }
        if !current.units.is_empty() {
            lines.push(current);
        }

        for line in &mut lines {
            collapse_trailing_space(line);
        }
        Ok(lines)
    }

    fn measure_unit(&mut self, unit: AtomicUnit) -> Result<MeasuredUnit, LayoutError> {
        match &unit.content {
            UnitContent::Image(key) => {
                let sprite = self
                    .sprites
                    .and_then(|provider| provider.resolve(key))
                    .ok_or_else(|| LayoutError::MissingImage {
                        tag: unit.tag_path.last().cloned().unwrap_or_default(),
                        key: key.clone(),
                    })?;
                let style = &unit.style;
                let mut width = sprite.width * style.img_scale * style.img_scale_width;
                let mut height = sprite.height * style.img_scale * style.img_scale_height;
                if style.img_display == ImageDisplay::Icon && self.scale_icons && height > 0.0 {
                    let font = self.cache.measure_font(self.measurer, style);
                    let ratio = (font.ascent * style.font_scale_height) / height;
                    width *= ratio;
                    height *= ratio;
                }
                let metrics = FontMetrics {
                    ascent: height,
                    descent: 0.0,
                    font_size: style.font_size,
                };
                Ok(MeasuredUnit {
                    unit,
                    presentation: String::new(),
                    width,
                    height,
                    metrics,
                    collapsed: false,
                    x: 0.0,
                    y: 0.0,
                })
            }
            UnitContent::Text(text) => {
                let style = &unit.style;
                let line_break = unit.is_line_break();
                let presentation = if line_break {
                    String::new()
                } else {
                    apply_transform(text, style.text_transform)
                };
                let width = if line_break {
                    0.0
                } else {
                    let raw = self.cache.measure(self.measurer, &presentation, style);
                    let chars = presentation.chars().count() as f32;
                    (raw.width + style.letter_spacing * chars) * style.font_scale_width
                };
                let font = self.cache.measure_font(self.measurer, style);
                let inflate = style.stroke_thickness.max(0.0) / 2.0;
                let metrics = FontMetrics {
                    ascent: (font.ascent + inflate) * style.font_scale_height,
                    descent: (font.descent + inflate) * style.font_scale_height,
                    font_size: font.font_size,
                };
                Ok(MeasuredUnit {
                    unit,
                    presentation,
                    width,
                    height: metrics.ascent + metrics.descent,
                    metrics,
                    collapsed: false,
                    x: 0.0,
                    y: 0.0,
                })
            }
        }
    }
}

/// Apply the presentation case transform. Logical content is never changed.
fn apply_transform(text: &str, transform: TextTransform) -> String {
    match transform {
        TextTransform::None => text.to_string(),
        TextTransform::Uppercase => text.to_uppercase(),
        TextTransform::Lowercase => text.to_lowercase(),
        TextTransform::Capitalize => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// A line can wrap only once it holds a printable word or an image.
fn line_has_anchor(line: &UnitLine) -> bool {
    line.units
        .iter()
        .any(|u| u.unit.is_image() || (!u.unit.text().is_empty() && !u.unit.is_whitespace()))
}

/// Zero the width of a trailing whitespace unit; the unit is retained so text
/// extraction and cursor placement stay correct.
fn collapse_trailing_space(line: &mut UnitLine) {
    if let Some(last) = line.units.last_mut() {
        if last.unit.is_whitespace() && !last.unit.is_image() {
            last.width = 0.0;
            last.collapsed = true;
        }
    }
}
