//! Splitter: flattens the styled tree into measurable atomic units.

use core::str::FromStr;

use crate::error::LayoutError;
use crate::parse::LINE_BREAK_TAG;
use crate::resolve::{StyledContent, StyledNode, TagPath};
use crate::style::ComputedStyle;

/// Granularity of atomic units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// Alternating word and whitespace runs; spaces stay independent units so
    /// wrap and justify logic can treat them on their own.
    #[default]
    Words,
    /// One unit per character, whitespace included.
    Characters,
}

const SPLIT_MODE_NAMES: [(&str, SplitMode); 2] = [
    ("words", SplitMode::Words),
    ("characters", SplitMode::Characters),
];

impl FromStr for SplitMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for (name, mode) in SPLIT_MODE_NAMES {
            if name == s {
                return Ok(mode);
            }
        }
        let suggestion = SPLIT_MODE_NAMES
            .iter()
            .min_by_key(|(name, _)| edit_distance(s, name))
            .map(|(name, _)| *name)
            .unwrap_or("words");
        Err(LayoutError::UnknownSplitMode {
            given: s.to_string(),
            suggestion,
        })
    }
}

/// Payload of an atomic unit.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitContent {
    Text(String),
    /// Sprite key resolved later by the caller's provider.
    Image(String),
}

/// Smallest splitter output: a word, whitespace run, character, or one inline
/// image, carrying its resolved style and tag path.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicUnit {
    pub content: UnitContent,
    pub tag_path: TagPath,
    pub style: ComputedStyle,
}

impl AtomicUnit {
    /// Logical text of this unit; empty for images.
    pub fn text(&self) -> &str {
        match &self.content {
            UnitContent::Text(text) => text,
            UnitContent::Image(_) => "",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, UnitContent::Image(_))
    }

    /// Non-empty text made entirely of whitespace.
    pub fn is_whitespace(&self) -> bool {
        let text = self.text();
        !text.is_empty() && text.chars().all(char::is_whitespace)
    }

    /// Unit emitted by the reserved line-break tag.
    pub fn is_line_break(&self) -> bool {
        self.tag_path
            .last()
            .is_some_and(|tag| tag == LINE_BREAK_TAG)
    }

    /// Tag path in its public string form, outermost first.
    pub fn tags(&self) -> String {
        self.tag_path.join(",")
    }
}

/// Flatten a styled tree into atomic units in document order.
///
/// Concatenating the text of every unit reproduces the input with tags
/// removed; image nodes contribute a single never-subdivided unit.
pub fn split(root: &StyledNode, mode: SplitMode) -> Vec<AtomicUnit> {
    let mut out = Vec::with_capacity(16);
    walk(root, mode, &mut out);
    out
}

fn walk(node: &StyledNode, mode: SplitMode, out: &mut Vec<AtomicUnit>) {
    match &node.content {
        StyledContent::Children(children) => {
            for child in children {
                walk(child, mode, out);
            }
        }
        StyledContent::Image(key) => out.push(AtomicUnit {
            content: UnitContent::Image(key.clone()),
            tag_path: node.tag_path.clone(),
            style: node.style.computed(),
        }),
        StyledContent::Text(text) => {
            let style = node.style.computed();
            match mode {
                SplitMode::Words => {
                    for run in split_runs(text) {
                        out.push(AtomicUnit {
                            content: UnitContent::Text(run.to_string()),
                            tag_path: node.tag_path.clone(),
                            style: style.clone(),
                        });
                    }
                }
                SplitMode::Characters => {
                    for ch in text.chars() {
                        out.push(AtomicUnit {
                            content: UnitContent::Text(ch.to_string()),
                            tag_path: node.tag_path.clone(),
                            style: style.clone(),
                        });
                    }
                }
            }
        }
    }
}

/// Split text into maximal runs that are either all-whitespace or all
/// printable, preserving order and content.
fn split_runs(text: &str) -> impl Iterator<Item = &str> {
    let mut runs = Vec::with_capacity(8);
    let mut start = 0usize;
    let mut run_is_ws: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let is_ws = ch.is_whitespace();
        match run_is_ws {
            Some(prev) if prev == is_ws => {}
            Some(_) => {
                runs.push(&text[start..idx]);
                start = idx;
                run_is_ws = Some(is_ws);
            }
            None => run_is_ws = Some(is_ws),
        }
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs.into_iter()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            row[j + 1] = substitution.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        core::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::TagParser;
    use crate::resolve::resolve;
    use crate::style::{StyleSheet, TextStyle};

    fn styled(markup: &str) -> StyledNode {
        let sheet = StyleSheet::default()
            .with_tag("b", TextStyle::default())
            .with_tag(
                "gem",
                TextStyle {
                    img_src: Some("gem.png".to_string()),
                    ..TextStyle::default()
                },
            );
        let tree = TagParser::any_tag().parse(markup).unwrap();
        resolve(&tree, &sheet).unwrap()
    }

    #[test]
    fn word_mode_alternates_words_and_spaces() {
        let units = split(&styled("one two  three"), SplitMode::Words);
        let texts: Vec<&str> = units.iter().map(AtomicUnit::text).collect();
        assert_eq!(texts, ["one", " ", "two", "  ", "three"]);
        assert!(units[1].is_whitespace());
        assert!(!units[2].is_whitespace());
    }

    #[test]
    fn character_mode_emits_single_chars() {
        let units = split(&styled("hi !"), SplitMode::Characters);
        let texts: Vec<&str> = units.iter().map(AtomicUnit::text).collect();
        assert_eq!(texts, ["h", "i", " ", "!"]);
    }

    #[test]
    fn concatenated_units_reproduce_tagless_text() {
        let source = "<b>Hello, big</b> world\nagain";
        for mode in [SplitMode::Words, SplitMode::Characters] {
            let joined: String = split(&styled(source), mode)
                .iter()
                .map(AtomicUnit::text)
                .collect();
            assert_eq!(joined, "Hello, big world\nagain");
        }
    }

    #[test]
    fn image_nodes_become_one_unit_with_empty_text() {
        let units = split(&styled("a <gem></gem> b"), SplitMode::Words);
        let image: Vec<&AtomicUnit> = units.iter().filter(|u| u.is_image()).collect();
        assert_eq!(image.len(), 1);
        assert_eq!(image[0].text(), "");
        assert_eq!(image[0].content, UnitContent::Image("gem.png".to_string()));
    }

    #[test]
    fn line_break_units_are_flagged() {
        let units = split(&styled("a\nb"), SplitMode::Words);
        assert_eq!(units.iter().filter(|u| u.is_line_break()).count(), 1);
    }

    #[test]
    fn unknown_split_mode_suggests_nearest() {
        let err = "word".parse::<SplitMode>().unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownSplitMode {
                given: "word".to_string(),
                suggestion: "words",
            }
        );
        let err = "character".parse::<SplitMode>().unwrap_err();
        assert!(matches!(
            err,
            LayoutError::UnknownSplitMode {
                suggestion: "characters",
                ..
            }
        ));
    }
}
