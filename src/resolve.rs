//! Style resolver: cascades stylesheet records over the parsed tag tree.

use smallvec::SmallVec;

use crate::error::LayoutError;
use crate::parse::{TagChild, TagNode};
use crate::style::{StyleSheet, TextStyle};

/// Ordered ancestor tag names, outermost first.
pub type TagPath = SmallVec<[String; 4]>;

/// Content of a styled node.
#[derive(Clone, Debug, PartialEq)]
pub enum StyledContent {
    /// Literal text run.
    Text(String),
    /// Inline image reference (a sprite key for the caller's provider).
    Image(String),
    /// Nested styled nodes, in document order.
    Children(Vec<StyledNode>),
}

/// One node of the resolved style tree.
///
/// `style` is the full cascade for this node: stylesheet default, then each
/// ancestor tag's record outermost first, then the node's own tag record,
/// then its inline attributes, later values winning. Nodes are immutable
/// values built bottom-up; nothing is shared with the input tag tree.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledNode {
    pub style: TextStyle,
    pub tag_path: TagPath,
    pub content: StyledContent,
}

/// Resolve the cascade for a parsed tag tree.
///
/// Unregistered tag names contribute nothing to the cascade; malformed inline
/// color attributes are fatal.
pub fn resolve(root: &TagNode, sheet: &StyleSheet) -> Result<StyledNode, LayoutError> {
    resolve_node(root, sheet, sheet.default_style(), &TagPath::new())
}

fn resolve_node(
    node: &TagNode,
    sheet: &StyleSheet,
    inherited: &TextStyle,
    path: &TagPath,
) -> Result<StyledNode, LayoutError> {
    let mut style = inherited.clone();
    let mut tag_path = path.clone();
    let mut introduces_image = false;

    if !node.tag_name.is_empty() {
        if let Some(tag_style) = sheet.tag_style(&node.tag_name) {
            introduces_image = tag_style.img_src.is_some();
            style = style.merged(tag_style);
        }
        for (name, value) in &node.attributes {
            style.apply_attribute(name, value)?;
        }
        introduces_image |= node.attributes.contains_key("imgSrc");
        tag_path.push(node.tag_name.clone());
    }

    let mut children = Vec::with_capacity(node.children.len() + usize::from(introduces_image));
    if introduces_image {
        if let Some(key) = style.img_src.clone() {
            children.push(StyledNode {
                style: style.clone(),
                tag_path: tag_path.clone(),
                content: StyledContent::Image(key),
            });
        }
    }

    // Images attach to the tag that declared them; text descendants must not
    // re-emit the same sprite.
    let mut child_inherit = style.clone();
    child_inherit.img_src = None;

    for child in &node.children {
        match child {
            TagChild::Text(text) => children.push(StyledNode {
                style: child_inherit.clone(),
                tag_path: tag_path.clone(),
                content: StyledContent::Text(text.clone()),
            }),
            TagChild::Tag(tag) => {
                children.push(resolve_node(tag, sheet, &child_inherit, &tag_path)?)
            }
        }
    }

    Ok(StyledNode {
        style,
        tag_path,
        content: StyledContent::Children(children),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::TagParser;
    use crate::style::{FontStyle, TextStyle};

    fn sheet() -> StyleSheet {
        StyleSheet::new(TextStyle {
            font_size: Some(16.0),
            ..TextStyle::default()
        })
        .with_tag(
            "b",
            TextStyle {
                font_weight: Some(700),
                ..TextStyle::default()
            },
        )
        .with_tag(
            "i",
            TextStyle {
                font_style: Some(FontStyle::Italic),
                ..TextStyle::default()
            },
        )
    }

    fn find_text<'a>(node: &'a StyledNode, needle: &str) -> Option<&'a StyledNode> {
        match &node.content {
            StyledContent::Text(text) if text.contains(needle) => Some(node),
            StyledContent::Children(children) => {
                children.iter().find_map(|child| find_text(child, needle))
            }
            _ => None,
        }
    }

    #[test]
    fn cascade_merges_outer_to_inner() {
        let tree = TagParser::any_tag()
            .parse("<b>Hello <i>World</i></b>")
            .unwrap();
        let styled = resolve(&tree, &sheet()).unwrap();

        let world = find_text(&styled, "World").unwrap();
        assert_eq!(world.tag_path.as_slice(), ["b", "i"]);
        assert_eq!(world.style.font_weight, Some(700));
        assert_eq!(world.style.font_style, Some(FontStyle::Italic));
        assert_eq!(world.style.font_size, Some(16.0));

        let hello = find_text(&styled, "Hello").unwrap();
        assert_eq!(hello.tag_path.as_slice(), ["b"]);
        assert_eq!(hello.style.font_style, None);
    }

    #[test]
    fn inline_attributes_override_tag_styles() {
        let tree = TagParser::any_tag()
            .parse(r#"<b fontWeight="300">thin</b>"#)
            .unwrap();
        let styled = resolve(&tree, &sheet()).unwrap();
        let thin = find_text(&styled, "thin").unwrap();
        assert_eq!(thin.style.font_weight, Some(300));
    }

    #[test]
    fn unknown_attributes_ride_along_harmlessly() {
        let tree = TagParser::any_tag()
            .parse(r#"<b data="x">ok</b>"#)
            .unwrap();
        let styled = resolve(&tree, &sheet()).unwrap();
        assert!(find_text(&styled, "ok").is_some());
    }

    #[test]
    fn image_tags_emit_one_image_node() {
        let sheet = sheet().with_tag(
            "gem",
            TextStyle {
                img_src: Some("gem.png".to_string()),
                ..TextStyle::default()
            },
        );
        let tree = TagParser::any_tag().parse("<gem>shiny</gem>").unwrap();
        let styled = resolve(&tree, &sheet).unwrap();

        fn count_images(node: &StyledNode) -> usize {
            match &node.content {
                StyledContent::Image(_) => 1,
                StyledContent::Children(children) => children.iter().map(count_images).sum(),
                _ => 0,
            }
        }
        assert_eq!(count_images(&styled), 1);
        assert!(find_text(&styled, "shiny").is_some());
    }

    #[test]
    fn bad_inline_color_is_fatal() {
        let tree = TagParser::any_tag()
            .parse(r#"<b fill="notacolor">x</b>"#)
            .unwrap();
        assert!(resolve(&tree, &sheet()).is_err());
    }
}
