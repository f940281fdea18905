//! Markup tag parser: tag text in, an ordered tag/text tree out.
//!
//! The grammar is deliberately not XML. Unknown tag names stay literal text,
//! unclosed tags at end of input are recoverable, and a trailing partial tag
//! fragment is trimmed so progressively revealed text never renders raw tag
//! syntax. Nesting is tracked with an explicit open-tag stack; a close tag
//! that does not match the innermost open tag is fatal.

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::LayoutError;

/// Reserved tag name injected for every literal newline.
///
/// User stylesheets may register a style for it (e.g. `paragraphSpacing`) but
/// must not repurpose the name for unrelated markup.
pub const LINE_BREAK_TAG: &str = "br";

/// Inline attribute value parsed from `name="value"` pairs.
///
/// Values that parse as a finite number are carried numerically so style
/// application does not re-parse them.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f32),
}

impl AttrValue {
    fn from_raw(raw: &str) -> Self {
        match raw.parse::<f32>() {
            Ok(n) if n.is_finite() && !raw.is_empty() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// String form of the value.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format!("{}", n),
        }
    }

    /// Numeric form, if the value is or parses as a number.
    pub fn to_f32(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse::<f32>().ok(),
        }
    }

    /// Boolean form: `true`/`false` text or nonzero number.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

/// One node of the parsed tag tree. The root carries an empty tag name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagNode {
    pub tag_name: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub children: Vec<TagChild>,
}

/// Ordered child of a tag node.
#[derive(Clone, Debug, PartialEq)]
pub enum TagChild {
    Tag(TagNode),
    Text(String),
}

static SELF_CLOSING_RE: Lazy<Regex> =
    Lazy::new(|| compile(r#"<(\w+)((?:\s+\w+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*/\s*>"#));
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| compile(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#));
static TRAILING_FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| compile(r"</?(?:\w+[^<>]*)?$"));

// Regex construction is infallible for the hand-written patterns above and
// for patterns assembled from escaped identifiers.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid tag pattern")
}

/// Tag-tree parser with an optional known-tag vocabulary.
#[derive(Clone, Debug)]
pub struct TagParser {
    tag_re: Regex,
}

impl TagParser {
    /// Parser recognizing any `\w+` identifier as a tag name.
    pub fn any_tag() -> Self {
        Self {
            tag_re: compile(&tag_pattern(r"\w+")),
        }
    }

    /// Parser recognizing only the given tag names (plus the reserved
    /// [`LINE_BREAK_TAG`]). Anything else stays literal text.
    pub fn with_known_tags<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocab: SmallVec<[&str; 16]> = names
            .into_iter()
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_'))
            .collect();
        if !vocab.iter().any(|name| *name == LINE_BREAK_TAG) {
            vocab.push(LINE_BREAK_TAG);
        }
        // Longest-first keeps prefix names (e.g. `b` vs `big`) unambiguous.
        vocab.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = vocab.join("|");
        Self {
            tag_re: compile(&tag_pattern(&format!("(?:{})", alternation))),
        }
    }

    /// Parse markup into an ordered tag/text tree rooted at an unnamed node.
    ///
    /// Every literal `\n` is rewritten to a paired [`LINE_BREAK_TAG`] before
    /// scanning so line breaks follow the same stack discipline as any other
    /// tag; self-closing tags are normalized to open/close pairs.
    pub fn parse(&self, markup: &str) -> Result<TagNode, LayoutError> {
        let trimmed = trim_trailing_fragment(markup);
        let with_breaks = trimmed.replace('\n', "<br>\n</br>");
        let normalized = SELF_CLOSING_RE.replace_all(&with_breaks, "<$1$2></$1>");

        let mut stack: Vec<TagNode> = Vec::with_capacity(8);
        stack.push(TagNode::default());
        let mut cursor = 0usize;

        for caps in self.tag_re.captures_iter(&normalized) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            if whole.0 > cursor {
                push_text(&mut stack, &normalized[cursor..whole.0]);
            }
            cursor = whole.1;

            let closing = caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
            let name = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            if closing {
                let expected = stack
                    .last()
                    .map(|node| node.tag_name.clone())
                    .unwrap_or_default();
                if stack.len() < 2 || expected != name {
                    return Err(LayoutError::UnbalancedTag {
                        expected,
                        found: name.to_string(),
                    });
                }
                pop_and_attach(&mut stack);
            } else {
                let attrs_raw = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                stack.push(TagNode {
                    tag_name: name.to_string(),
                    attributes: parse_attributes(attrs_raw),
                    children: Vec::new(),
                });
            }
        }
        if cursor < normalized.len() {
            push_text(&mut stack, &normalized[cursor..]);
        }

        while stack.len() > 1 {
            if let Some(open) = stack.last() {
                log::warn!(
                    "unclosed tag <{}> at end of input; keeping its content",
                    open.tag_name
                );
            }
            pop_and_attach(&mut stack);
        }
        Ok(stack.pop().unwrap_or_default())
    }
}

fn tag_pattern(name_pattern: &str) -> String {
    format!(
        r#"<(/?)({})((?:\s+\w+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*>"#,
        name_pattern
    )
}

/// Drop an incomplete tag fragment at the very end of the text (`…<b attr="x`)
/// so typewriter-style partial reveals never show raw tag syntax. A bare `<`
/// followed by whitespace is ordinary text and is kept.
fn trim_trailing_fragment(markup: &str) -> Cow<'_, str> {
    match TRAILING_FRAGMENT_RE.find(markup) {
        Some(found) if found.start() < markup.len() => {
            log::debug!(
                "trimming trailing tag fragment {:?}",
                &markup[found.start()..]
            );
            Cow::Borrowed(&markup[..found.start()])
        }
        _ => Cow::Borrowed(markup),
    }
}

fn parse_attributes(raw: &str) -> BTreeMap<String, AttrValue> {
    let mut out = BTreeMap::new();
    for caps in ATTRIBUTE_RE.captures_iter(raw) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        out.insert(name.to_string(), AttrValue::from_raw(value));
    }
    out
}

fn push_text(stack: &mut Vec<TagNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.children.push(TagChild::Text(text.to_string()));
    }
}

fn pop_and_attach(stack: &mut Vec<TagNode>) {
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(TagChild::Tag(node));
        } else {
            stack.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(node: &TagNode) -> String {
        let mut out = String::new();
        collect(node, &mut out);
        fn collect(node: &TagNode, out: &mut String) {
            for child in &node.children {
                match child {
                    TagChild::Text(text) => out.push_str(text),
                    TagChild::Tag(tag) => collect(tag, out),
                }
            }
        }
        out
    }

    #[test]
    fn balanced_markup_parses_and_preserves_order() {
        let parser = TagParser::any_tag();
        let root = parser.parse("a<b>c<i>d</i>e</b>f").unwrap();
        assert_eq!(text_of(&root), "acdef");
        assert_eq!(root.children.len(), 3);
        let TagChild::Tag(b) = &root.children[1] else {
            panic!("expected tag child");
        };
        assert_eq!(b.tag_name, "b");
        assert_eq!(b.children.len(), 3);
    }

    #[test]
    fn mismatched_close_tag_is_fatal() {
        let parser = TagParser::any_tag();
        let err = parser.parse("<b>text</i>").unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnbalancedTag {
                expected: "b".to_string(),
                found: "i".to_string(),
            }
        );
    }

    #[test]
    fn close_without_open_is_fatal() {
        let parser = TagParser::any_tag();
        assert!(parser.parse("text</b>").is_err());
    }

    #[test]
    fn unclosed_tag_keeps_content() {
        let parser = TagParser::any_tag();
        let root = parser.parse("<b>still here").unwrap();
        assert_eq!(text_of(&root), "still here");
        let TagChild::Tag(b) = &root.children[0] else {
            panic!("expected tag child");
        };
        assert_eq!(b.tag_name, "b");
    }

    #[test]
    fn self_closing_tags_normalize_to_pairs() {
        let parser = TagParser::any_tag();
        let root = parser.parse(r#"x<icon name="gem" />y"#).unwrap();
        assert_eq!(root.children.len(), 3);
        let TagChild::Tag(icon) = &root.children[1] else {
            panic!("expected tag child");
        };
        assert_eq!(icon.tag_name, "icon");
        assert_eq!(
            icon.attributes.get("name"),
            Some(&AttrValue::Text("gem".to_string()))
        );
        assert!(icon.children.is_empty());
    }

    #[test]
    fn attributes_parse_with_either_quote_style_and_numbers() {
        let parser = TagParser::any_tag();
        let root = parser
            .parse(r#"<t a="hi" b='2' fontSize="24">x</t>"#)
            .unwrap();
        let TagChild::Tag(t) = &root.children[0] else {
            panic!("expected tag child");
        };
        assert_eq!(t.attributes.get("a"), Some(&AttrValue::Text("hi".to_string())));
        assert_eq!(t.attributes.get("b"), Some(&AttrValue::Number(2.0)));
        assert_eq!(t.attributes.get("fontSize"), Some(&AttrValue::Number(24.0)));
    }

    #[test]
    fn newlines_become_line_break_tags() {
        let parser = TagParser::any_tag();
        let root = parser.parse("one\ntwo").unwrap();
        let TagChild::Tag(br) = &root.children[1] else {
            panic!("expected line-break tag");
        };
        assert_eq!(br.tag_name, LINE_BREAK_TAG);
        assert_eq!(text_of(&root), "one\ntwo");
    }

    #[test]
    fn unknown_tags_stay_literal_with_restricted_vocabulary() {
        let parser = TagParser::with_known_tags(["b"]);
        let root = parser.parse("<b>ok</b> <i>raw</i>").unwrap();
        assert_eq!(text_of(&root), "ok <i>raw</i>");
    }

    #[test]
    fn trailing_fragment_is_trimmed_silently() {
        let parser = TagParser::any_tag();
        let root = parser.parse("Hello <b>wor</b><i").unwrap();
        assert_eq!(text_of(&root), "Hello wor");
        let root = parser.parse(r#"Hello <b attr="x"#).unwrap();
        assert_eq!(text_of(&root), "Hello ");
    }

    #[test]
    fn lone_angle_bracket_in_prose_is_kept() {
        let parser = TagParser::any_tag();
        let root = parser.parse("3 < 4").unwrap();
        assert_eq!(text_of(&root), "3 < 4");
    }
}
