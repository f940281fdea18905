//! Final output: positioned tokens grouped into words and lines.

use crate::measure::FontMetrics;
use crate::style::{Color, ComputedStyle};
use crate::wrap::{MeasuredUnit, UnitLine};

/// Axis-aligned rectangle in layout space, y growing downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// What a token draws.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenContent {
    /// Logical text as written in the markup, untransformed.
    Text(String),
    /// Sprite key to draw at the token bounds.
    Image(String),
}

/// One decoration stripe (underline, overline, or line-through).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    pub color: Color,
    pub bounds: Rect,
}

/// A positioned, styled atomic unit. Immutable result data; rendering needs
/// nothing beyond what is stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalToken {
    pub content: TokenContent,
    /// Transform-applied string to draw; empty for images and line breaks.
    pub presentation: String,
    pub bounds: Rect,
    /// Stroke-inflated, scale-applied metrics of the token's font.
    pub font_properties: FontMetrics,
    pub style: ComputedStyle,
    /// Comma-joined tag path, outermost first, e.g. `"b,i"`.
    pub tags: String,
    pub decorations: Vec<Decoration>,
    /// Trailing whitespace collapsed to zero width at a line end.
    pub collapsed: bool,
    /// Token emitted by the reserved line-break tag.
    pub line_break: bool,
}

impl FinalToken {
    /// Logical text; empty for images.
    pub fn text(&self) -> &str {
        match &self.content {
            TokenContent::Text(text) => text,
            TokenContent::Image(_) => "",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, TokenContent::Image(_))
    }

    pub fn is_whitespace(&self) -> bool {
        let text = self.text();
        !text.is_empty() && text.chars().all(char::is_whitespace)
    }
}

/// Tokens forming one word, or a single whitespace/image/line-break token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Word {
    pub tokens: Vec<FinalToken>,
}

impl Word {
    /// Concatenated logical text of the word.
    pub fn text(&self) -> String {
        self.tokens.iter().map(FinalToken::text).collect()
    }

    pub fn bounds(&self) -> Rect {
        union_all(self.tokens.iter().map(|t| t.bounds))
    }
}

/// One laid-out line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    pub words: Vec<Word>,
}

impl Line {
    pub fn tokens(&self) -> impl Iterator<Item = &FinalToken> {
        self.words.iter().flat_map(|w| w.tokens.iter())
    }

    pub fn text(&self) -> String {
        self.tokens().map(FinalToken::text).collect()
    }

    pub fn bounds(&self) -> Rect {
        union_all(self.tokens().map(|t| t.bounds))
    }
}

/// Complete result of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
    pub lines: Vec<Line>,
}

impl LayoutResult {
    /// All tokens in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &FinalToken> {
        self.lines.iter().flat_map(Line::tokens)
    }

    /// Original text with tags removed; line-break tokens carry their newline.
    pub fn text(&self) -> String {
        self.tokens().map(FinalToken::text).collect()
    }

    /// Bounding box of every token.
    pub fn bounds(&self) -> Rect {
        union_all(self.tokens().map(|t| t.bounds))
    }
}

fn union_all(rects: impl Iterator<Item = Rect>) -> Rect {
    let mut out: Option<Rect> = None;
    for rect in rects {
        out = Some(match out {
            Some(acc) => acc.union(&rect),
            None => rect,
        });
    }
    out.unwrap_or_default()
}

/// Group positioned units into the public line/word/token structure.
///
/// A word is a maximal run of adjacent printable units; whitespace runs,
/// images with surrounding space, and line-break units each stand as their
/// own single-token word.
pub(crate) fn assemble(lines: Vec<UnitLine>) -> LayoutResult {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let mut words: Vec<Word> = Vec::with_capacity(line.units.len());
        let mut current = Word::default();
        for unit in line.units {
            let standalone = unit.unit.is_whitespace() || unit.unit.is_line_break();
            let token = make_token(unit);
            if standalone {
                if !current.tokens.is_empty() {
                    words.push(core::mem::take(&mut current));
                }
                words.push(Word {
                    tokens: vec![token],
                });
            } else {
                current.tokens.push(token);
            }
        }
        if !current.tokens.is_empty() {
            words.push(current);
        }
        out.push(Line { words });
    }
    LayoutResult { lines: out }
}

fn make_token(unit: MeasuredUnit) -> FinalToken {
    let line_break = unit.unit.is_line_break();
    let bounds = Rect {
        x: unit.x,
        y: unit.y,
        width: unit.width,
        height: unit.height,
    };
    let decorations = if unit.unit.is_image() || line_break {
        Vec::new()
    } else {
        decorations_for(&unit, bounds)
    };
    let content = match unit.unit.content {
        crate::split::UnitContent::Text(text) => TokenContent::Text(text),
        crate::split::UnitContent::Image(key) => TokenContent::Image(key),
    };
    FinalToken {
        content,
        presentation: unit.presentation,
        bounds,
        font_properties: unit.metrics,
        tags: unit.unit.tag_path.join(","),
        style: unit.unit.style,
        decorations,
        collapsed: unit.collapsed,
        line_break,
    }
}

fn decorations_for(unit: &MeasuredUnit, bounds: Rect) -> Vec<Decoration> {
    let style = &unit.unit.style;
    let marks = style.text_decoration;
    if marks.is_none() || bounds.width <= 0.0 {
        return Vec::new();
    }
    let baseline = bounds.y + unit.metrics.ascent;
    let default_thickness = (style.font_size / 15.0).max(1.0);
    let stripe = |y: f32, color: Option<Color>, thickness: Option<f32>| Decoration {
        color: color.unwrap_or(style.fill),
        bounds: Rect {
            x: bounds.x,
            y,
            width: bounds.width,
            height: thickness.unwrap_or(default_thickness),
        },
    };
    let mut out = Vec::with_capacity(1);
    if marks.underline {
        out.push(stripe(
            baseline + style.underline_offset,
            style.underline_color,
            style.underline_thickness,
        ));
    }
    if marks.overline {
        out.push(stripe(
            bounds.y + style.overline_offset,
            style.overline_color,
            style.overline_thickness,
        ));
    }
    if marks.line_through {
        out.push(stripe(
            baseline - unit.metrics.ascent * 0.4 + style.line_through_offset,
            style.line_through_color,
            style.line_through_thickness,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::FixedTextMeasurer;
    use crate::parse::TagParser;
    use crate::resolve::resolve;
    use crate::split::{split, SplitMode};
    use crate::style::{StyleSheet, TextDecoration, TextStyle};
    use crate::wrap::LineBreaker;

    fn layout(markup: &str, sheet: &StyleSheet, wrap_width: f32) -> LayoutResult {
        let measurer = FixedTextMeasurer::new(10.0);
        let tree = TagParser::any_tag().parse(markup).unwrap();
        let units = split(&resolve(&tree, sheet).unwrap(), SplitMode::Words);
        let mut lines = LineBreaker::new(&measurer, None, true)
            .break_units(units, wrap_width, true)
            .unwrap();
        crate::align::apply_horizontal(&mut lines, crate::style::Align::Left, wrap_width);
        crate::align::apply_vertical(&mut lines, 0.0);
        assemble(lines)
    }

    #[test]
    fn adjacent_styled_fragments_form_one_word() {
        let sheet = StyleSheet::default().with_tag(
            "u",
            TextStyle {
                font_weight: Some(700),
                ..TextStyle::default()
            },
        );
        let result = layout("S<u>U</u>PER! done", &sheet, 1000.0);
        let line = &result.lines[0];
        assert_eq!(line.words.len(), 3);
        assert_eq!(line.words[0].text(), "SUPER!");
        assert_eq!(line.words[0].tokens.len(), 3);
        assert_eq!(line.words[1].text(), " ");
        assert_eq!(line.words[2].text(), "done");
    }

    #[test]
    fn result_text_reproduces_the_untagged_input() {
        let sheet = StyleSheet::default();
        let result = layout("one two\nthree", &sheet, 1000.0);
        assert_eq!(result.text(), "one two\nthree");
    }

    #[test]
    fn word_bounds_cover_their_tokens() {
        let sheet = StyleSheet::default();
        let result = layout("abc de", &sheet, 1000.0);
        let word = &result.lines[0].words[0];
        assert_eq!(word.bounds(), Rect {
            x: 0.0,
            y: 0.0,
            width: 30.0,
            height: 16.0,
        });
        let total = result.bounds();
        assert_eq!(total.width, 60.0);
        assert_eq!(total.height, 16.0);
    }

    #[test]
    fn underline_sits_below_the_baseline_in_fill_color() {
        let sheet = StyleSheet::default().with_tag(
            "u",
            TextStyle {
                fill: Some(Color(0x336699)),
                text_decoration: Some(TextDecoration {
                    underline: true,
                    ..TextDecoration::default()
                }),
                ..TextStyle::default()
            },
        );
        let result = layout("<u>hi</u>", &sheet, 1000.0);
        let token = result.tokens().next().unwrap();
        assert_eq!(token.decorations.len(), 1);
        let deco = token.decorations[0];
        assert_eq!(deco.color, Color(0x336699));
        // FixedTextMeasurer baseline is at ascent 12.
        assert_eq!(deco.bounds.y, 12.0);
        assert_eq!(deco.bounds.width, token.bounds.width);
    }

    #[test]
    fn explicit_decoration_color_and_thickness_win() {
        let sheet = StyleSheet::default().with_tag(
            "mark",
            TextStyle {
                text_decoration: Some(TextDecoration {
                    line_through: true,
                    ..TextDecoration::default()
                }),
                line_through_color: Some(Color(0xFF0000)),
                line_through_thickness: Some(3.0),
                ..TextStyle::default()
            },
        );
        let result = layout("<mark>gone</mark>", &sheet, 1000.0);
        let deco = result.tokens().next().unwrap().decorations[0];
        assert_eq!(deco.color, Color(0xFF0000));
        assert_eq!(deco.bounds.height, 3.0);
    }

    #[test]
    fn collapsed_trailing_space_is_flagged_and_zero_width() {
        let sheet = StyleSheet::default();
        let result = layout("aaaa bb cc", &sheet, 85.0);
        let line = &result.lines[0];
        let space = line.tokens().last().unwrap();
        assert!(space.is_whitespace());
        assert!(space.collapsed);
        assert_eq!(space.bounds.width, 0.0);
    }

    #[test]
    fn line_break_tokens_carry_no_decorations_or_width() {
        let sheet = StyleSheet::new(TextStyle {
            text_decoration: Some(TextDecoration {
                underline: true,
                ..TextDecoration::default()
            }),
            ..TextStyle::default()
        });
        let result = layout("a\nb", &sheet, 1000.0);
        let brk = result.tokens().find(|t| t.line_break).unwrap();
        assert_eq!(brk.bounds.width, 0.0);
        assert!(brk.decorations.is_empty());
        assert_eq!(brk.text(), "\n");
    }
}
