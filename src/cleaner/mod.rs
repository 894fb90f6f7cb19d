//! # Content Cleaner
//!
//! Rewrites the top-level fragments of an HTML body so they can either live
//! in a rich text field or be picked up by the block builder.
//!
//! For each top-level element:
//!
//! 1. If its tag is in the rich text allow-list it is emitted unchanged.
//! 2. Otherwise its signature is looked up in the [`CleaningRules`]; the
//!    matching rule's actions are applied in order.
//! 3. Fragments without a matching rule pass through unchanged. They are
//!    reported so the rule table can be extended.
//!
//! Top-level text and comment nodes are not classified and are dropped.

mod actions;
mod rules;

pub use actions::{
    make_paragraph, promote_child, unwrap_element, CleanAction, DEFAULT_UNWRAP_TAGS,
};
pub use rules::{CleaningRule, CleaningRules};

use crate::model::{parse_elements, parse_fragments, to_html, Node};
use crate::signature::SignatureMode;
use serde::{Deserialize, Serialize};

/// Tags that are safe to keep in a rich text field as they are.
pub const DEFAULT_RICHTEXT_TAGS: &[&str] = &[
    "p", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote", "a", "img", "strong", "em", "br",
    "hr", "sub", "sup", "del",
];

/// Cleaner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerOptions {
    /// Top-level tags emitted without signature matching.
    pub richtext_tags: Vec<String>,
    /// How fragment signatures are computed for rule lookup. Defaults to
    /// every descendant in document order.
    pub signature_mode: SignatureMode,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            richtext_tags: DEFAULT_RICHTEXT_TAGS.iter().map(|t| t.to_string()).collect(),
            signature_mode: SignatureMode::Descendants,
        }
    }
}

impl CleanerOptions {
    /// Creates options with the default allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rich text allow-list.
    pub fn with_richtext_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.richtext_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the signature mode.
    pub fn with_signature_mode(mut self, mode: SignatureMode) -> Self {
        self.signature_mode = mode;
        self
    }
}

/// Result of cleaning one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// The cleaned HTML.
    pub html: String,
    /// Fragments emitted through the rich text allow-list.
    pub kept: usize,
    /// Fragments rewritten by a rule.
    pub cleaned: usize,
    /// Signatures of fragments no rule matched, in document order.
    pub unmatched: Vec<String>,
}

/// Rule-driven fragment rewriter.
#[derive(Debug, Clone, Default)]
pub struct ContentCleaner {
    rules: CleaningRules,
    options: CleanerOptions,
}

impl ContentCleaner {
    /// Creates a cleaner.
    pub fn new(rules: CleaningRules, options: CleanerOptions) -> Self {
        Self { rules, options }
    }

    /// Returns the rule table.
    pub fn rules(&self) -> &CleaningRules {
        &self.rules
    }

    /// Returns the options.
    pub fn options(&self) -> &CleanerOptions {
        &self.options
    }

    /// Cleans `html` and returns the rewritten markup.
    ///
    /// # Example
    ///
    /// ```
    /// use wpblocks::cleaner::{CleanerOptions, CleaningRules, ContentCleaner};
    ///
    /// let rules = CleaningRules::from_table([("div:p:strong:", vec!["promote_child(1)"])])?;
    /// let cleaner = ContentCleaner::new(rules, CleanerOptions::default());
    /// assert_eq!(
    ///     cleaner.clean("<div><p><strong>Keep</strong></p></div>"),
    ///     "<p><strong>Keep</strong></p>"
    /// );
    /// # Ok::<(), wpblocks::Error>(())
    /// ```
    pub fn clean(&self, html: &str) -> String {
        self.clean_report(html).html
    }

    /// Cleans `html` and reports what happened to each fragment.
    pub fn clean_report(&self, html: &str) -> CleanReport {
        let mut report = CleanReport::default();
        let mut output: Vec<Node> = Vec::new();

        for element in parse_elements(html) {
            if self.options.richtext_tags.iter().any(|tag| *tag == element.name) {
                report.kept += 1;
                output.push(Node::Element(element));
                continue;
            }

            let signature = self.options.signature_mode.signature(&element);
            match self.rules.find(&signature) {
                Some(rule) => {
                    tracing::debug!(
                        signature = %signature,
                        rule = %rule.prefix,
                        "cleaning fragment"
                    );
                    let mut nodes = vec![Node::Element(element)];
                    for action in &rule.actions {
                        nodes = action.apply(nodes);
                    }
                    report.cleaned += 1;
                    output.extend(nodes);
                }
                None => {
                    tracing::debug!(signature = %signature, "no cleaning rule, passing through");
                    report.unmatched.push(signature);
                    output.push(Node::Element(element));
                }
            }
        }

        report.html = to_html(&output);
        report
    }
}

/// Removes every element with one of the given tag names from `html`,
/// keeping the removed elements' contents in place.
///
/// Used to flatten layout wrappers (by default `div`) across a whole body.
///
/// # Example
///
/// ```
/// use wpblocks::cleaner::unwrap_tags;
///
/// let html = "<div><p>one</p><div><p>two</p></div></div>";
/// assert_eq!(unwrap_tags(html, &["div"]), "<p>one</p><p>two</p>");
/// ```
pub fn unwrap_tags<S: AsRef<str>>(html: &str, tags: &[S]) -> String {
    let tags: Vec<String> = if tags.is_empty() {
        DEFAULT_UNWRAP_TAGS.iter().map(|t| t.to_string()).collect()
    } else {
        tags.iter().map(|t| t.as_ref().to_ascii_lowercase()).collect()
    };

    let nodes: Vec<Node> = parse_fragments(html)
        .into_iter()
        .flat_map(|node| match node {
            Node::Element(element) => unwrap_element(element, &tags),
            text => vec![text],
        })
        .collect();
    to_html(&nodes)
}
