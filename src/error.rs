use core::fmt;

/// Fatal error raised while laying out tagged markup.
///
/// Recoverable conditions (unclosed tags at end of input, a trailing partial
/// tag fragment, missing optional style values) never surface here; they are
/// reported through the `log` facade and layout proceeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A close tag did not match the innermost open tag.
    UnbalancedTag {
        /// Innermost open tag that was expected to close next.
        expected: String,
        /// Close tag actually encountered.
        found: String,
    },
    /// A split-mode string named no supported mode.
    UnknownSplitMode {
        /// The rejected mode string.
        given: String,
        /// Closest valid mode by edit distance.
        suggestion: &'static str,
    },
    /// An alignment-mode string named no supported mode.
    UnknownAlign {
        /// The rejected mode string.
        given: String,
    },
    /// An image-styled tag referenced a sprite the provider cannot resolve.
    MissingImage {
        /// Tag carrying the image style.
        tag: String,
        /// Unresolved sprite key.
        key: String,
    },
    /// A color value could not be parsed as `#rgb`, `#rrggbb`, `0x` hex, or
    /// a decimal integer.
    InvalidColor {
        /// Style property the value was supplied for.
        property: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedTag { expected, found } => write!(
                f,
                "unbalanced markup: expected </{}> but found </{}>",
                expected, found
            ),
            Self::UnknownSplitMode { given, suggestion } => write!(
                f,
                "unknown split mode {:?}; did you mean {:?}?",
                given, suggestion
            ),
            Self::UnknownAlign { given } => {
                write!(f, "unknown alignment mode {:?}", given)
            }
            Self::MissingImage { tag, key } => write!(
                f,
                "tag <{}> references image {:?} but no sprite resolves to it",
                tag, key
            ),
            Self::InvalidColor { property, value } => write!(
                f,
                "invalid color {:?} for {}; expected #rgb, #rrggbb, 0x hex, or decimal",
                value, property
            ),
        }
    }
}

impl std::error::Error for LayoutError {}
