//! Owned HTML tree used by every pipeline stage.
//!
//! Markup is parsed with `scraper` (html5ever), which repairs malformed input
//! the way a browser would, and then copied into this explicit
//! element-or-text representation. Comments, doctypes and processing
//! instructions are dropped during the copy.
//!
//! Elements nested deeper than [`MAX_DEPTH`] are flattened: their tags are
//! dropped and their contents are spliced into the deepest kept ancestor.
//! Every other pass over the tree can therefore rely on a bounded depth.

use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Node as ScraperNode};

/// Maximum element nesting kept when copying a parsed tree.
pub const MAX_DEPTH: usize = 512;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is serialized verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

/// A node in a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element(Element),
    /// A run of character data.
    Text(String),
}

impl Node {
    /// Creates a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Consumes the node, returning the element if this node is one.
    pub fn into_element(self) -> Option<Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Returns the concatenated text content of this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    /// Serializes this node back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    fn collect_text(&self, out: &mut String) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(content) => out.push_str(content),
                Node::Element(element) => stack.extend(element.children.iter().rev()),
            }
        }
    }

    fn write_html(&self, out: &mut String, raw_text: bool) {
        write_steps(vec![Step::node(self, raw_text)], out);
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Lowercase local tag name.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Returns the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if this is a void element.
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }

    /// Iterates over child elements, skipping text.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Returns the first child element, ignoring text nodes.
    pub fn first_element_child(&self) -> Option<&Element> {
        self.element_children().next()
    }

    /// Iterates over all descendant elements in document order.
    ///
    /// The element itself is not included.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Element> = self.element_children().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// Returns this element followed by all of its descendants.
    pub fn self_and_descendants(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(self).chain(self.descendants())
    }

    /// Returns the first descendant with the given tag name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|element| element.name == name)
    }

    /// Returns the concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Returns true if this element's text is serialized without escaping.
    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.name.as_str())
    }

    /// Serializes the element and its subtree to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serializes only the children of this element.
    pub fn inner_html(&self) -> String {
        let raw = self.is_raw_text();
        let mut out = String::new();
        write_steps(
            self.children.iter().rev().map(|child| Step::node(child, raw)).collect(),
            &mut out,
        );
        out
    }

    fn write_html(&self, out: &mut String) {
        write_steps(vec![Step::Element(self)], out);
    }

    fn write_open_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
        out.push('>');
    }
}

/// Pending serialization work, popped from the back.
enum Step<'a> {
    Text(&'a str, bool),
    Element(&'a Element),
    Close(&'a str),
}

impl<'a> Step<'a> {
    fn node(node: &'a Node, raw_text: bool) -> Self {
        match node {
            Node::Text(content) => Step::Text(content.as_str(), raw_text),
            Node::Element(element) => Step::Element(element),
        }
    }
}

fn write_steps(mut stack: Vec<Step<'_>>, out: &mut String) {
    while let Some(step) = stack.pop() {
        match step {
            Step::Text(content, true) => out.push_str(content),
            Step::Text(content, false) => escape_text(content, out),
            Step::Element(element) => {
                element.write_open_tag(out);
                if element.is_void() {
                    continue;
                }
                stack.push(Step::Close(element.name.as_str()));
                let raw = element.is_raw_text();
                stack.extend(element.children.iter().rev().map(|child| Step::node(child, raw)));
            }
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(current.element_children());
        self.stack[start..].reverse();
        Some(current)
    }
}

/// Parses an HTML string and returns its top-level nodes.
pub fn parse_fragments(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

/// Parses an HTML string and returns only its top-level elements.
pub fn parse_elements(html: &str) -> Vec<Element> {
    parse_fragments(html)
        .into_iter()
        .filter_map(Node::into_element)
        .collect()
}

/// Serializes a list of nodes back to HTML.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out, false);
    }
    out
}

/// Returns every element named in `names`, searching the top-level elements
/// and all of their descendants in document order.
pub fn find_all<'a>(elements: &'a [Element], names: &[&str]) -> Vec<&'a Element> {
    elements
        .iter()
        .flat_map(Element::self_and_descendants)
        .filter(|element| names.contains(&element.name.as_str()))
        .collect()
}

/// Copies the children of `root` with an explicit stack of open elements.
fn convert_children(root: ElementRef<'_>) -> Vec<Node> {
    let mut top: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    // Open elements below `MAX_DEPTH` whose tags are being dropped.
    let mut flattened = 0usize;
    let mut dropped = 0usize;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) if node.id() != root.id() => match node.value() {
                ScraperNode::Text(text) => {
                    let text = Node::Text(String::from(&**text));
                    match open.last_mut() {
                        Some(parent) => parent.children.push(text),
                        None => top.push(text),
                    }
                }
                ScraperNode::Element(value) if open.len() < MAX_DEPTH => {
                    open.push(Element {
                        name: value.name().to_string(),
                        attrs: value
                            .attrs()
                            .map(|(key, val)| (key.to_string(), val.to_string()))
                            .collect(),
                        children: Vec::new(),
                    });
                }
                ScraperNode::Element(_) => {
                    flattened += 1;
                    dropped += 1;
                }
                _ => {}
            },
            Edge::Close(node) if node.id() != root.id() && node.value().is_element() => {
                if flattened > 0 {
                    flattened -= 1;
                    continue;
                }
                if let Some(element) = open.pop() {
                    match open.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => top.push(Node::Element(element)),
                    }
                }
            }
            _ => {}
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, max_depth = MAX_DEPTH, "flattened deeply nested elements");
    }
    top
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
