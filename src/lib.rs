//! Tagged-markup text layout: styled runs, word wrap, and positioned tokens.
//!
//! Input is plain text with HTML-like style tags (`<b>bold <i>both</i></b>`).
//! A [`StyleSheet`] maps tag names to sparse [`TextStyle`] records; nested
//! tags cascade, innermost winning per property. The engine splits the styled
//! text into atomic units (words or characters), wraps them greedily against
//! a width using a pluggable [`TextMeasurer`], aligns lines horizontally and
//! units vertically, and returns an immutable [`LayoutResult`] of positioned
//! [`FinalToken`]s ready for any renderer.
//!
//! ```
//! use tagtext::{StyleSheet, TagTextEngine, TextStyle};
//!
//! let sheet = StyleSheet::new(TextStyle {
//!     font_size: Some(24.0),
//!     ..TextStyle::default()
//! })
//! .with_tag(
//!     "b",
//!     TextStyle {
//!         font_weight: Some(700),
//!         ..TextStyle::default()
//!     },
//! );
//! let engine = TagTextEngine::new(sheet);
//! let result = engine.layout("plain and <b>bold</b>")?;
//! assert_eq!(result.lines.len(), 1);
//! assert_eq!(result.text(), "plain and bold");
//! # Ok::<(), tagtext::LayoutError>(())
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod align;
mod error;
mod measure;
mod parse;
mod resolve;
mod split;
mod style;
mod token;
mod wrap;

use std::sync::Arc;

pub use error::LayoutError;
pub use measure::{
    FixedTextMeasurer, FontMetrics, HeuristicTextMeasurer, Size, SpriteProvider, SpriteSize,
    TextMeasurer,
};
pub use parse::{AttrValue, TagChild, TagNode, TagParser, LINE_BREAK_TAG};
pub use resolve::{resolve, StyledContent, StyledNode, TagPath};
pub use split::{split, AtomicUnit, SplitMode, UnitContent};
pub use style::{
    Align, Color, ComputedStyle, FontStyle, ImageDisplay, LastLine, StyleSheet, TextDecoration,
    TextStyle, TextTransform, VAlign,
};
pub use token::{Decoration, FinalToken, LayoutResult, Line, Rect, TokenContent, Word};

/// Engine behavior knobs independent of any style.
#[derive(Clone, Copy, Debug)]
pub struct LayoutOptions {
    /// Atomic unit granularity.
    pub split_mode: SplitMode,
    /// Scale icon-display images to the surrounding font ascent.
    pub scale_icons: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::Words,
            scale_icons: true,
        }
    }
}

/// The layout pipeline behind one stylesheet.
///
/// Construction is cheap; the engine holds no mutable state and one instance
/// can lay out any number of strings. Wrap width, wrapping mode, alignment,
/// and line spacing come from the stylesheet's default record.
#[derive(Clone)]
pub struct TagTextEngine {
    sheet: StyleSheet,
    options: LayoutOptions,
    measurer: Arc<dyn TextMeasurer>,
    sprites: Option<Arc<dyn SpriteProvider>>,
}

impl TagTextEngine {
    /// Engine with the built-in [`HeuristicTextMeasurer`] and no sprites.
    pub fn new(sheet: StyleSheet) -> Self {
        Self {
            sheet,
            options: LayoutOptions::default(),
            measurer: Arc::new(HeuristicTextMeasurer),
            sprites: None,
        }
    }

    /// Replace the text measurer.
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Attach a sprite provider; required once any tag styles an image.
    pub fn with_sprite_provider(mut self, sprites: Arc<dyn SpriteProvider>) -> Self {
        self.sprites = Some(sprites);
        self
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    /// The stylesheet this engine lays out against.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Lay out one markup string.
    ///
    /// Tags not registered in the stylesheet are left as literal text by the
    /// parser. Errors are fatal and leave nothing partially laid out; an
    /// unclosed tag at end of input is recovered with a warning instead.
    pub fn layout(&self, markup: &str) -> Result<LayoutResult, LayoutError> {
        let parser = TagParser::with_known_tags(self.sheet.tag_names());
        let tree = parser.parse(markup)?;
        let styled = resolve(&tree, &self.sheet)?;
        let units = split(&styled, self.options.split_mode);

        let defaults = self.sheet.default_style().computed();
        let mut breaker = wrap::LineBreaker::new(
            self.measurer.as_ref(),
            self.sprites.as_deref(),
            self.options.scale_icons,
        );
        let mut lines =
            breaker.break_units(units, defaults.word_wrap_width, defaults.word_wrap)?;
        // With wrapping off there is no right edge to align against.
        let align_width = if defaults.word_wrap {
            defaults.word_wrap_width
        } else {
            0.0
        };
        align::apply_horizontal(&mut lines, defaults.align, align_width);
        align::apply_vertical(&mut lines, defaults.line_spacing);
        Ok(token::assemble(lines))
    }
}

impl std::fmt::Debug for TagTextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagTextEngine")
            .field("sheet", &self.sheet)
            .field("options", &self.options)
            .field("has_sprites", &self.sprites.is_some())
            .finish()
    }
}
