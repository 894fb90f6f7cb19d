//! Tag signatures.
//!
//! A signature is a separator-terminated string describing the tag-nesting
//! shape of a fragment, e.g. `div:p:strong:`. Only the first-element-child
//! spine is encoded, so fragments that differ in later siblings share a
//! signature. Rule tables are tuned against this coarse definition.

use crate::model::{Element, Node};

/// Default segment separator.
pub const SEPARATOR: &str = ":";

/// Makes the first-child-chain signature of an element.
///
/// # Example
///
/// ```
/// use wpblocks::model::parse_elements;
/// use wpblocks::signature::make_signature;
///
/// let elements = parse_elements(r##"<p><strong><a href="#">x</a></strong> plain text</p>"##);
/// assert_eq!(make_signature(&elements[0]), "p:strong:a:");
/// ```
pub fn make_signature(element: &Element) -> String {
    let mut signature = format!("{}{}", element.name, SEPARATOR);
    let mut current = element.first_element_child();
    while let Some(child) = current {
        signature.push_str(&child.name);
        signature.push_str(SEPARATOR);
        current = child.first_element_child();
    }
    signature
}

/// Makes a signature from the element and every descendant element in
/// document order.
pub fn make_descendant_signature(element: &Element) -> String {
    element
        .self_and_descendants()
        .map(|e| format!("{}{}", e.name, SEPARATOR))
        .collect()
}

/// How a fragment's signature is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMode {
    /// Follow the first element child at each level.
    #[default]
    FirstChild,
    /// Every descendant element in document order.
    Descendants,
}

impl SignatureMode {
    /// Computes the signature of `element` in this mode.
    pub fn signature(self, element: &Element) -> String {
        match self {
            SignatureMode::FirstChild => make_signature(element),
            SignatureMode::Descendants => make_descendant_signature(element),
        }
    }
}

/// Streaming signature maker over whole documents.
///
/// Tag names accumulate as tags open; every closing tag flushes the
/// accumulated names as one signature and starts over. Void elements such as
/// `img` and `br` have no closing tag, so they accumulate without flushing:
/// `<figure><img><figcaption>c</figcaption></figure>` yields
/// `figure:img:figcaption:`. For well-formed content made of one block per
/// top-level element this yields one signature per top-level element.
#[derive(Debug, Clone)]
pub struct SignatureMaker {
    separator: String,
    include_attrs: bool,
    dedupe: bool,
}

impl Default for SignatureMaker {
    fn default() -> Self {
        Self {
            separator: SEPARATOR.to_string(),
            include_attrs: false,
            dedupe: true,
        }
    }
}

impl SignatureMaker {
    /// Creates a maker with the default separator and deduplication enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Includes sorted `name=value` attribute pairs in each segment.
    pub fn with_attrs(mut self, include: bool) -> Self {
        self.include_attrs = include;
        self
    }

    /// Enables or disables duplicate removal.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Returns the signatures found in `html`.
    pub fn signatures(&self, html: &str) -> Vec<String> {
        let nodes = crate::model::parse_fragments(html);
        self.signatures_of(&nodes)
    }

    /// Returns only the first signature found in `html`.
    pub fn first_signature(&self, html: &str) -> Option<String> {
        self.signatures(html).into_iter().next()
    }

    /// Returns the signatures of already parsed nodes.
    pub fn signatures_of(&self, nodes: &[Node]) -> Vec<String> {
        let mut walk = Walk {
            maker: self,
            opens: Vec::new(),
            closed: Vec::new(),
        };
        for node in nodes {
            if let Node::Element(element) = node {
                walk.visit(element);
            }
        }

        let mut signatures: Vec<String> = Vec::with_capacity(walk.closed.len());
        for signature in walk.closed.into_iter().filter(|s| !s.is_empty()) {
            if self.dedupe && signatures.contains(&signature) {
                continue;
            }
            signatures.push(signature);
        }

        signatures
            .into_iter()
            .map(|s| format!("{}{}", s, self.separator))
            .collect()
    }

    fn segment(&self, element: &Element) -> String {
        if !self.include_attrs || element.attrs.is_empty() {
            return element.name.clone();
        }

        let mut attrs: Vec<&(String, String)> = element.attrs.iter().collect();
        attrs.sort();
        let pairs: Vec<String> = attrs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("{}[{}]", element.name, pairs.join(","))
    }
}

struct Walk<'a> {
    maker: &'a SignatureMaker,
    opens: Vec<String>,
    closed: Vec<String>,
}

enum Visit<'a> {
    Open(&'a Element),
    Close,
}

impl Walk<'_> {
    fn visit(&mut self, root: &Element) {
        let mut stack = vec![Visit::Open(root)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Open(element) => {
                    self.opens.push(self.maker.segment(element));
                    // Void elements never see a closing tag.
                    if element.is_void() {
                        continue;
                    }
                    stack.push(Visit::Close);
                    let children: Vec<&Element> = element.element_children().collect();
                    stack.extend(children.into_iter().rev().map(Visit::Open));
                }
                Visit::Close => {
                    self.closed.push(self.opens.join(&self.maker.separator));
                    self.opens.clear();
                }
            }
        }
    }
}
