//! Cleaning actions.
//!
//! Actions are referenced by symbolic name in rule tables:
//!
//! | reference                         | action                                   |
//! |-----------------------------------|------------------------------------------|
//! | `dont_clean`                      | leave the fragment as it is              |
//! | `promote_content`                 | `promote_child(1)`                       |
//! | `promote_child(N)`                | strip `N` wrapper levels                 |
//! | `convert_to_paragraph`            | replace the fragment with `<p>text</p>`  |
//! | `make_paragraph`                  | same as `convert_to_paragraph`           |
//! | `unwrap(tag, ...)`                | remove the named tags, keep their content |
//!
//! Dotted paths such as `app.content_cleaner.dont_clean` resolve by their
//! last segment so tables written for the old importer load unchanged.

use crate::error::{Error, Result};
use crate::model::{Element, Node};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][\w.]*)\s*(?:\(\s*([^()]*?)\s*\))?\s*$").unwrap()
});

/// Tags unwrapped by `unwrap` when no tag list is given.
pub const DEFAULT_UNWRAP_TAGS: &[&str] = &["div"];

/// A single fragment transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanAction {
    /// Identity.
    DontClean,
    /// Descend `depth` levels of first element children, discarding each
    /// enclosing tag. A depth of zero is treated as one.
    PromoteChild { depth: usize },
    /// Replace the fragment with a paragraph holding its text.
    MakeParagraph,
    /// Remove elements with these tag names, keeping their children.
    Unwrap { tags: Vec<String> },
}

impl CleanAction {
    /// `promote_content`: strip the outermost wrapper.
    pub fn promote_content() -> Self {
        CleanAction::PromoteChild { depth: 1 }
    }

    /// Applies the action to a list of nodes. Text nodes pass through.
    pub fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .flat_map(|node| match node {
                Node::Element(element) => self.apply_element(element),
                text => vec![text],
            })
            .collect()
    }

    /// Applies the action to one element.
    pub fn apply_element(&self, element: Element) -> Vec<Node> {
        match self {
            CleanAction::DontClean => vec![Node::Element(element)],
            CleanAction::PromoteChild { depth } => {
                vec![Node::Element(promote_child(element, *depth))]
            }
            CleanAction::MakeParagraph => vec![Node::Element(make_paragraph(&element))],
            CleanAction::Unwrap { tags } => unwrap_element(element, tags),
        }
    }
}

impl fmt::Display for CleanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanAction::DontClean => write!(f, "dont_clean"),
            CleanAction::PromoteChild { depth } => write!(f, "promote_child({})", depth),
            CleanAction::MakeParagraph => write!(f, "make_paragraph"),
            CleanAction::Unwrap { tags } => write!(f, "unwrap({})", tags.join(",")),
        }
    }
}

impl FromStr for CleanAction {
    type Err = Error;

    fn from_str(reference: &str) -> Result<Self> {
        let caps = RE_ACTION
            .captures(reference)
            .ok_or_else(|| Error::InvalidAction(reference.to_string()))?;

        let path = &caps[1];
        let name = path.rsplit('.').next().unwrap_or(path);
        let args: Vec<&str> = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        match name {
            "dont_clean" if args.is_empty() => Ok(CleanAction::DontClean),
            "promote_content" if args.is_empty() => Ok(CleanAction::promote_content()),
            "promote_child" => match args.as_slice() {
                [] => Ok(CleanAction::promote_content()),
                [depth] => depth
                    .strip_prefix("depth=")
                    .unwrap_or(depth)
                    .parse()
                    .map(|depth| CleanAction::PromoteChild { depth })
                    .map_err(|_| Error::InvalidAction(reference.to_string())),
                _ => Err(Error::InvalidAction(reference.to_string())),
            },
            "convert_to_paragraph" | "make_paragraph" if args.is_empty() => {
                Ok(CleanAction::MakeParagraph)
            }
            "unwrap" => {
                let tags = if args.is_empty() {
                    DEFAULT_UNWRAP_TAGS.iter().map(|t| t.to_string()).collect()
                } else {
                    args.iter().map(|t| t.to_ascii_lowercase()).collect()
                };
                Ok(CleanAction::Unwrap { tags })
            }
            "dont_clean" | "promote_content" | "convert_to_paragraph" | "make_paragraph" => {
                Err(Error::InvalidAction(reference.to_string()))
            }
            _ => Err(Error::UnknownAction {
                prefix: String::new(),
                name: name.to_string(),
            }),
        }
    }
}

/// Descends through first element children, discarding each wrapper.
///
/// Stops early when a level has no element child and returns the element
/// reached so far.
pub fn promote_child(element: Element, depth: usize) -> Element {
    let mut current = element;
    for _ in 0..depth.max(1) {
        let Some(index) = current.children.iter().position(|n| n.as_element().is_some()) else {
            break;
        };
        match current.children.swap_remove(index) {
            Node::Element(child) => current = child,
            Node::Text(_) => break,
        }
    }
    current
}

/// Wraps the element's text content in a new paragraph.
pub fn make_paragraph(element: &Element) -> Element {
    Element::new("p").with_text(element.text())
}

/// Removes every element named in `tags` (including `element` itself),
/// splicing its children into the parent.
pub fn unwrap_element(element: Element, tags: &[String]) -> Vec<Node> {
    let children: Vec<Node> = element
        .children
        .into_iter()
        .flat_map(|child| match child {
            Node::Element(inner) => unwrap_element(inner, tags),
            text => vec![text],
        })
        .collect();

    if tags.iter().any(|tag| *tag == element.name) {
        children
    } else {
        vec![Node::Element(Element {
            name: element.name,
            attrs: element.attrs,
            children,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_elements, to_html};

    fn run(action: &CleanAction, html: &str) -> String {
        let element = parse_elements(html).remove(0);
        to_html(&action.apply_element(element))
    }

    #[test]
    fn test_dont_clean_is_identity() {
        let html = r#"<figure class="wp-block-image"><img src="a.jpg"></figure>"#;
        assert_eq!(run(&CleanAction::DontClean, html), html);
    }

    #[test]
    fn test_promote_one_level() {
        let action = CleanAction::PromoteChild { depth: 1 };
        assert_eq!(
            run(&action, "<div><p><strong>Keep</strong></p></div>"),
            "<p><strong>Keep</strong></p>"
        );
    }

    #[test]
    fn test_promote_depth_zero_still_descends() {
        let action = CleanAction::PromoteChild { depth: 0 };
        assert_eq!(run(&action, "<div><p>x</p></div>"), "<p>x</p>");
    }

    #[test]
    fn test_promote_two_levels() {
        let action = CleanAction::PromoteChild { depth: 2 };
        assert_eq!(
            run(&action, "<div><div><p>inner</p></div></div>"),
            "<p>inner</p>"
        );
    }

    #[test]
    fn test_promote_stops_when_no_children() {
        let action = CleanAction::PromoteChild { depth: 5 };
        assert_eq!(run(&action, "<div><p>leaf</p></div>"), "<p>leaf</p>");
        assert_eq!(run(&action, "<div>only text</div>"), "<div>only text</div>");
    }

    #[test]
    fn test_promote_takes_first_element_child() {
        let action = CleanAction::promote_content();
        assert_eq!(
            run(&action, "<div> <figure><img src=\"a\"></figure><p>dropped</p></div>"),
            "<figure><img src=\"a\"></figure>"
        );
    }

    #[test]
    fn test_make_paragraph() {
        assert_eq!(run(&CleanAction::MakeParagraph, "<div>text</div>"), "<p>text</p>");
        assert_eq!(
            run(&CleanAction::MakeParagraph, "<div><a href=\"x\">link</a> and <br>more</div>"),
            "<p>link and more</p>"
        );
    }

    #[test]
    fn test_unwrap_root_and_nested() {
        let action = CleanAction::Unwrap {
            tags: vec!["div".into(), "span".into()],
        };
        assert_eq!(
            run(&action, "<div><p>a <span>b</span></p><div>c</div></div>"),
            "<p>a b</p>c"
        );
    }

    #[test]
    fn test_apply_passes_text_through() {
        let nodes = vec![Node::text("x"), Node::Element(Element::new("div").with_text("y"))];
        let out = CleanAction::MakeParagraph.apply(nodes);
        assert_eq!(to_html(&out), "x<p>y</p>");
    }

    #[test]
    fn test_parse_references() {
        assert_eq!("dont_clean".parse::<CleanAction>().unwrap(), CleanAction::DontClean);
        assert_eq!(
            "promote_content".parse::<CleanAction>().unwrap(),
            CleanAction::PromoteChild { depth: 1 }
        );
        assert_eq!(
            "promote_child(3)".parse::<CleanAction>().unwrap(),
            CleanAction::PromoteChild { depth: 3 }
        );
        assert_eq!(
            "promote_child(depth=2)".parse::<CleanAction>().unwrap(),
            CleanAction::PromoteChild { depth: 2 }
        );
        assert_eq!(
            "convert_to_paragraph".parse::<CleanAction>().unwrap(),
            CleanAction::MakeParagraph
        );
        assert_eq!(
            "unwrap(DIV, span)".parse::<CleanAction>().unwrap(),
            CleanAction::Unwrap {
                tags: vec!["div".into(), "span".into()]
            }
        );
        assert_eq!(
            "unwrap".parse::<CleanAction>().unwrap(),
            CleanAction::Unwrap {
                tags: vec!["div".into()]
            }
        );
    }

    #[test]
    fn test_parse_dotted_path() {
        let action: CleanAction = "wagtail_toolbox.wordpress.content_cleaner.promote_content"
            .parse()
            .unwrap();
        assert_eq!(action, CleanAction::promote_content());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "shred".parse::<CleanAction>(),
            Err(Error::UnknownAction { .. })
        ));
        assert!(matches!(
            "promote_child(x)".parse::<CleanAction>(),
            Err(Error::InvalidAction(_))
        ));
        assert!(matches!(
            "dont_clean(1)".parse::<CleanAction>(),
            Err(Error::InvalidAction(_))
        ));
        assert!(matches!("".parse::<CleanAction>(), Err(Error::InvalidAction(_))));
    }

    #[test]
    fn test_display_round_trip() {
        for action in [
            CleanAction::DontClean,
            CleanAction::PromoteChild { depth: 2 },
            CleanAction::MakeParagraph,
            CleanAction::Unwrap {
                tags: vec!["div".into(), "section".into()],
            },
        ] {
            assert_eq!(action.to_string().parse::<CleanAction>().unwrap(), action);
        }
    }
}
