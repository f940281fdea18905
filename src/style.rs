//! Style records, the tag stylesheet, and the cascade merge.

use std::collections::BTreeMap;

use crate::error::LayoutError;
use crate::parse::AttrValue;

/// Packed RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);

    /// Parse `#rgb`, `#rrggbb`, `0x` hex, or decimal notation.
    pub fn parse(value: &str, property: &'static str) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidColor {
            property,
            value: value.to_string(),
        };
        let trimmed = value.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return match hex.len() {
                3 => {
                    let packed = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                    let r = (packed >> 8) & 0xF;
                    let g = (packed >> 4) & 0xF;
                    let b = packed & 0xF;
                    Ok(Color((r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)))
                }
                6 => u32::from_str_radix(hex, 16).map(Color).map_err(|_| invalid()),
                _ => Err(invalid()),
            };
        }
        if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            return u32::from_str_radix(hex, 16).map(Color).map_err(|_| invalid());
        }
        trimmed.parse::<u32>().map(Color).map_err(|_| invalid())
    }
}

/// Horizontal alignment mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
    /// Justify with the given policy for the last line of each paragraph.
    Justify(LastLine),
}

/// Last-line policy for justified text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LastLine {
    Left,
    Right,
    Center,
    /// Justify every line, the last one included.
    All,
}

impl Align {
    /// Parse an alignment mode string. Unknown modes are fatal.
    pub fn parse(value: &str) -> Result<Self, LayoutError> {
        match value {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" => Ok(Self::Center),
            "justify" | "justify-left" => Ok(Self::Justify(LastLine::Left)),
            "justify-right" => Ok(Self::Justify(LastLine::Right)),
            "justify-center" => Ok(Self::Justify(LastLine::Center)),
            "justify-all" => Ok(Self::Justify(LastLine::All)),
            other => Err(LayoutError::UnknownAlign {
                given: other.to_string(),
            }),
        }
    }
}

/// Vertical alignment of a unit within its line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
    #[default]
    Baseline,
    /// Offset from the line baseline; positive raises the unit.
    Offset(f32),
}

impl VAlign {
    fn parse_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Number(n) => Some(Self::Offset(*n)),
            AttrValue::Text(s) => match s.as_str() {
                "top" => Some(Self::Top),
                "middle" => Some(Self::Middle),
                "bottom" => Some(Self::Bottom),
                "baseline" => Some(Self::Baseline),
                other => other.parse::<f32>().ok().map(Self::Offset),
            },
        }
    }
}

/// Font slant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Case transform applied to the rendered presentation string only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

/// Decoration line toggles; several may be active at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextDecoration {
    pub underline: bool,
    pub overline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    /// Parse a whitespace-separated decoration list, e.g. `"underline line-through"`.
    /// Unrecognized entries are ignored.
    pub fn parse(value: &str) -> Self {
        let mut out = Self::default();
        for part in value.split_whitespace() {
            match part {
                "underline" => out.underline = true,
                "overline" => out.overline = true,
                "line-through" => out.line_through = true,
                _ => {}
            }
        }
        out
    }

    pub fn is_none(&self) -> bool {
        !(self.underline || self.overline || self.line_through)
    }
}

/// Placement mode for an image-styled tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageDisplay {
    /// Flows with surrounding text.
    #[default]
    Inline,
    /// Inline, scaled so its height matches the surrounding font ascent.
    Icon,
    /// Occupies its own line; forces a break after placement.
    Block,
}

/// Sparse style record used as cascade input.
///
/// Every field is optional; unset fields inherit from outer tags and
/// ultimately from the stylesheet default. See [`TextStyle::merged`] for the
/// override order and [`ComputedStyle`] for the resolved defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_thickness: Option<f32>,
    pub align: Option<Align>,
    pub valign: Option<VAlign>,
    pub letter_spacing: Option<f32>,
    pub line_spacing: Option<f32>,
    pub paragraph_spacing: Option<f32>,
    pub word_wrap: Option<bool>,
    pub word_wrap_width: Option<f32>,
    pub break_words: Option<bool>,
    pub font_scale_width: Option<f32>,
    pub font_scale_height: Option<f32>,
    pub text_transform: Option<TextTransform>,
    pub text_decoration: Option<TextDecoration>,
    pub underline_color: Option<Color>,
    pub underline_thickness: Option<f32>,
    pub underline_offset: Option<f32>,
    pub overline_color: Option<Color>,
    pub overline_thickness: Option<f32>,
    pub overline_offset: Option<f32>,
    pub line_through_color: Option<Color>,
    pub line_through_thickness: Option<f32>,
    pub line_through_offset: Option<f32>,
    pub img_src: Option<String>,
    pub img_display: Option<ImageDisplay>,
    pub img_scale: Option<f32>,
    pub img_scale_width: Option<f32>,
    pub img_scale_height: Option<f32>,
}

impl TextStyle {
    /// Shallow key-wise cascade merge: any field set on `over` wins, all other
    /// fields keep the value from `self`. Object-valued properties are
    /// replaced wholesale, never deep-merged.
    pub fn merged(&self, over: &TextStyle) -> TextStyle {
        macro_rules! pick {
            ($field:ident) => {
                over.$field.clone().or_else(|| self.$field.clone())
            };
        }
        TextStyle {
            font_family: pick!(font_family),
            font_size: pick!(font_size),
            font_weight: pick!(font_weight),
            font_style: pick!(font_style),
            fill: pick!(fill),
            stroke: pick!(stroke),
            stroke_thickness: pick!(stroke_thickness),
            align: pick!(align),
            valign: pick!(valign),
            letter_spacing: pick!(letter_spacing),
            line_spacing: pick!(line_spacing),
            paragraph_spacing: pick!(paragraph_spacing),
            word_wrap: pick!(word_wrap),
            word_wrap_width: pick!(word_wrap_width),
            break_words: pick!(break_words),
            font_scale_width: pick!(font_scale_width),
            font_scale_height: pick!(font_scale_height),
            text_transform: pick!(text_transform),
            text_decoration: pick!(text_decoration),
            underline_color: pick!(underline_color),
            underline_thickness: pick!(underline_thickness),
            underline_offset: pick!(underline_offset),
            overline_color: pick!(overline_color),
            overline_thickness: pick!(overline_thickness),
            overline_offset: pick!(overline_offset),
            line_through_color: pick!(line_through_color),
            line_through_thickness: pick!(line_through_thickness),
            line_through_offset: pick!(line_through_offset),
            img_src: pick!(img_src),
            img_display: pick!(img_display),
            img_scale: pick!(img_scale),
            img_scale_width: pick!(img_scale_width),
            img_scale_height: pick!(img_scale_height),
        }
    }

    /// Apply one inline markup attribute.
    ///
    /// Attribute names use the markup property vocabulary (`fontWeight`,
    /// `imgSrc`, ...). Unknown names are ignored so data attributes can ride
    /// along in markup; malformed color values are fatal.
    pub fn apply_attribute(&mut self, name: &str, value: &AttrValue) -> Result<(), LayoutError> {
        match name {
            "fontFamily" => self.font_family = Some(value.to_text()),
            "fontSize" => self.font_size = value.to_f32(),
            "fontWeight" => self.font_weight = value.to_f32().map(|w| w as u16),
            "fontStyle" => {
                self.font_style = match value.to_text().as_str() {
                    "italic" => Some(FontStyle::Italic),
                    "oblique" => Some(FontStyle::Oblique),
                    "normal" => Some(FontStyle::Normal),
                    _ => self.font_style,
                }
            }
            "fill" | "color" => self.fill = Some(Color::parse(&value.to_text(), "fill")?),
            "stroke" => self.stroke = Some(Color::parse(&value.to_text(), "stroke")?),
            "strokeThickness" => self.stroke_thickness = value.to_f32(),
            "align" => self.align = Some(Align::parse(&value.to_text())?),
            "valign" => self.valign = VAlign::parse_attr(value).or(self.valign),
            "letterSpacing" => self.letter_spacing = value.to_f32(),
            "lineSpacing" => self.line_spacing = value.to_f32(),
            "paragraphSpacing" => self.paragraph_spacing = value.to_f32(),
            "wordWrap" => self.word_wrap = value.to_bool(),
            "wordWrapWidth" => self.word_wrap_width = value.to_f32(),
            "breakWords" => self.break_words = value.to_bool(),
            "fontScaleWidth" => self.font_scale_width = value.to_f32(),
            "fontScaleHeight" => self.font_scale_height = value.to_f32(),
            "textTransform" => {
                self.text_transform = match value.to_text().as_str() {
                    "uppercase" => Some(TextTransform::Uppercase),
                    "lowercase" => Some(TextTransform::Lowercase),
                    "capitalize" => Some(TextTransform::Capitalize),
                    "none" => Some(TextTransform::None),
                    _ => self.text_transform,
                }
            }
            "textDecoration" => {
                self.text_decoration = Some(TextDecoration::parse(&value.to_text()))
            }
            "underlineColor" => {
                self.underline_color = Some(Color::parse(&value.to_text(), "underlineColor")?)
            }
            "underlineThickness" => self.underline_thickness = value.to_f32(),
            "underlineOffset" => self.underline_offset = value.to_f32(),
            "overlineColor" => {
                self.overline_color = Some(Color::parse(&value.to_text(), "overlineColor")?)
            }
            "overlineThickness" => self.overline_thickness = value.to_f32(),
            "overlineOffset" => self.overline_offset = value.to_f32(),
            "lineThroughColor" => {
                self.line_through_color = Some(Color::parse(&value.to_text(), "lineThroughColor")?)
            }
            "lineThroughThickness" => self.line_through_thickness = value.to_f32(),
            "lineThroughOffset" => self.line_through_offset = value.to_f32(),
            "imgSrc" => self.img_src = Some(value.to_text()),
            "imgDisplay" => {
                self.img_display = match value.to_text().as_str() {
                    "inline" => Some(ImageDisplay::Inline),
                    "icon" => Some(ImageDisplay::Icon),
                    "block" => Some(ImageDisplay::Block),
                    _ => self.img_display,
                }
            }
            "imgScale" => self.img_scale = value.to_f32(),
            "imgScaleWidth" => self.img_scale_width = value.to_f32(),
            "imgScaleHeight" => self.img_scale_height = value.to_f32(),
            _ => {}
        }
        Ok(())
    }

    /// Resolve this record into a dense style with documented defaults.
    pub fn computed(&self) -> ComputedStyle {
        ComputedStyle {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| "sans-serif".to_string()),
            font_size: self.font_size.unwrap_or(16.0),
            font_weight: self.font_weight.unwrap_or(400),
            font_style: self.font_style.unwrap_or_default(),
            fill: self.fill.unwrap_or(Color::BLACK),
            stroke: self.stroke,
            stroke_thickness: self.stroke_thickness.unwrap_or(0.0).max(0.0),
            align: self.align.unwrap_or_default(),
            valign: self.valign.unwrap_or_default(),
            letter_spacing: self.letter_spacing.unwrap_or(0.0),
            line_spacing: self.line_spacing.unwrap_or(0.0),
            paragraph_spacing: self.paragraph_spacing.unwrap_or(0.0),
            word_wrap: self.word_wrap.unwrap_or(true),
            word_wrap_width: self.word_wrap_width.unwrap_or(0.0),
            break_words: self.break_words.unwrap_or(false),
            font_scale_width: sanitize_scale(self.font_scale_width.unwrap_or(1.0)),
            font_scale_height: sanitize_scale(self.font_scale_height.unwrap_or(1.0)),
            text_transform: self.text_transform.unwrap_or_default(),
            text_decoration: self.text_decoration.unwrap_or_default(),
            underline_color: self.underline_color,
            underline_thickness: self.underline_thickness,
            underline_offset: self.underline_offset.unwrap_or(0.0),
            overline_color: self.overline_color,
            overline_thickness: self.overline_thickness,
            overline_offset: self.overline_offset.unwrap_or(0.0),
            line_through_color: self.line_through_color,
            line_through_thickness: self.line_through_thickness,
            line_through_offset: self.line_through_offset.unwrap_or(0.0),
            img_src: self.img_src.clone(),
            img_display: self.img_display.unwrap_or_default(),
            img_scale: sanitize_scale(self.img_scale.unwrap_or(1.0)),
            img_scale_width: sanitize_scale(self.img_scale_width.unwrap_or(1.0)),
            img_scale_height: sanitize_scale(self.img_scale_height.unwrap_or(1.0)),
        }
    }
}

/// Clamp scale factors: negative and non-finite values collapse to 0.
fn sanitize_scale(value: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// Fully resolved style attached to every atomic unit and output token.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub fill: Color,
    pub stroke: Option<Color>,
    pub stroke_thickness: f32,
    pub align: Align,
    pub valign: VAlign,
    pub letter_spacing: f32,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    pub word_wrap: bool,
    pub word_wrap_width: f32,
    pub break_words: bool,
    pub font_scale_width: f32,
    pub font_scale_height: f32,
    pub text_transform: TextTransform,
    pub text_decoration: TextDecoration,
    pub underline_color: Option<Color>,
    pub underline_thickness: Option<f32>,
    pub underline_offset: f32,
    pub overline_color: Option<Color>,
    pub overline_thickness: Option<f32>,
    pub overline_offset: f32,
    pub line_through_color: Option<Color>,
    pub line_through_thickness: Option<f32>,
    pub line_through_offset: f32,
    pub img_src: Option<String>,
    pub img_display: ImageDisplay,
    pub img_scale: f32,
    pub img_scale_width: f32,
    pub img_scale_height: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        TextStyle::default().computed()
    }
}

/// Tag-name to style configuration for one layout pass.
///
/// Immutable once handed to the engine; there is no process-wide default
/// state. The `default` record seeds the cascade for every node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    default: TextStyle,
    tags: BTreeMap<String, TextStyle>,
}

impl StyleSheet {
    /// Create a stylesheet with the given default record.
    pub fn new(default: TextStyle) -> Self {
        Self {
            default,
            tags: BTreeMap::new(),
        }
    }

    /// Register a tag style, replacing any previous record for that tag.
    pub fn with_tag(mut self, name: impl Into<String>, style: TextStyle) -> Self {
        self.tags.insert(name.into(), style);
        self
    }

    /// Style registered for `name`, or `None` for unregistered tags.
    pub fn tag_style(&self, name: &str) -> Option<&TextStyle> {
        self.tags.get(name)
    }

    /// The default record seeding every cascade.
    pub fn default_style(&self) -> &TextStyle {
        &self.default
    }

    /// Registered tag names, used to restrict the parser's tag vocabulary.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parse_accepts_common_notations() {
        assert_eq!(Color::parse("#fff", "fill").unwrap(), Color(0xFFFFFF));
        assert_eq!(Color::parse("#ff8000", "fill").unwrap(), Color(0xFF8000));
        assert_eq!(Color::parse("0xFF8000", "fill").unwrap(), Color(0xFF8000));
        assert_eq!(Color::parse("255", "fill").unwrap(), Color(255));
    }

    #[test]
    fn color_parse_rejects_garbage() {
        let err = Color::parse("chartreuse", "underlineColor").unwrap_err();
        assert!(matches!(
            err,
            crate::LayoutError::InvalidColor {
                property: "underlineColor",
                ..
            }
        ));
    }

    #[test]
    fn align_parse_covers_justify_variants() {
        assert_eq!(Align::parse("justify").unwrap(), Align::Justify(LastLine::Left));
        assert_eq!(
            Align::parse("justify-center").unwrap(),
            Align::Justify(LastLine::Center)
        );
        assert_eq!(
            Align::parse("justify-all").unwrap(),
            Align::Justify(LastLine::All)
        );
        assert!(Align::parse("justified").is_err());
    }

    #[test]
    fn merged_prefers_overlay_fields_and_keeps_the_rest() {
        let base = TextStyle {
            font_size: Some(20.0),
            font_weight: Some(400),
            ..TextStyle::default()
        };
        let over = TextStyle {
            font_weight: Some(700),
            ..TextStyle::default()
        };
        let merged = base.merged(&over);
        assert_eq!(merged.font_size, Some(20.0));
        assert_eq!(merged.font_weight, Some(700));
    }

    #[test]
    fn computed_clamps_bad_scale_factors() {
        let style = TextStyle {
            font_scale_width: Some(-2.0),
            font_scale_height: Some(f32::NAN),
            ..TextStyle::default()
        };
        let computed = style.computed();
        assert_eq!(computed.font_scale_width, 0.0);
        assert_eq!(computed.font_scale_height, 0.0);
    }

    #[test]
    fn unregistered_tag_lookup_is_none() {
        let sheet = StyleSheet::default();
        assert!(sheet.tag_style("nope").is_none());
    }
}
