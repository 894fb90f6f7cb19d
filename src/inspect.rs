//! # Signature Inspector
//!
//! Surveys a corpus of source documents and reports which signatures occur,
//! so the signature table can be filled in before a real import. Reports can
//! be saved into a [`SignatureTable`] with a best-guess builder per
//! signature.

use crate::cleaner::ContentCleaner;
use crate::model::{parse_elements, SourceDocument};
use crate::signature::{make_signature, SEPARATOR};
use crate::table::{SignatureEntry, SignatureTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Root segments skipped by default; these fragments are fine as rich text.
pub const DEFAULT_ALLOW_TOP_LEVEL: &[&str] = &[
    "p:", "h2:", "h3:", "h4:", "h5:", "h6:", "ul:", "ol:", "img:", "a:", "sup:", "sub:", "strong:",
    "em:", "strike:", "code:", "hr:",
];

/// Keyword → builder guesses, checked in order against the signature's
/// segments.
const BUILDER_GUESSES: &[(&str, &str)] = &[
    ("table", "table"),
    ("iframe", "embed"),
    ("blockquote", "block_quote"),
    ("dl", "description"),
    ("address", "address"),
    ("pre", "pre"),
    ("form", "form"),
    ("h1", "heading"),
    ("h2", "heading"),
    ("h3", "heading"),
    ("h4", "heading"),
    ("h5", "heading"),
    ("h6", "heading"),
    ("img", "image"),
    ("figure", "figure"),
];

/// Builder guessed when no keyword matches.
pub const DEFAULT_GUESS: &str = "rich_text";

/// Guesses a builder for a signature.
///
/// The first keyword in the guess table that appears as a segment wins.
///
/// ```
/// use wpblocks::inspect::guess_builder;
///
/// assert_eq!(guess_builder("figure:iframe:"), "embed");
/// assert_eq!(guess_builder("div:h3:"), "heading");
/// assert_eq!(guess_builder("div:span:"), "rich_text");
/// ```
pub fn guess_builder(signature: &str) -> &'static str {
    let segments: Vec<&str> = signature
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();
    BUILDER_GUESSES
        .iter()
        .find(|(keyword, _)| segments.contains(keyword))
        .map(|(_, builder)| *builder)
        .unwrap_or(DEFAULT_GUESS)
}

/// Inspector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorOptions {
    /// Root segments (`tag:`) whose fragments are not reported.
    pub allow_top_level: Vec<String>,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            allow_top_level: DEFAULT_ALLOW_TOP_LEVEL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InspectorOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the top-level allow list.
    pub fn with_allow_top_level<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_top_level = segments.into_iter().map(Into::into).collect();
        self
    }
}

/// Distinct signatures found in a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    /// Occurrences per signature, sorted by signature.
    pub counts: BTreeMap<String, usize>,
    /// Source models each signature was seen in.
    #[serde(default)]
    pub models: BTreeMap<String, BTreeSet<String>>,
    /// Documents inspected.
    pub documents: usize,
}

impl InspectionReport {
    /// Sorted, de-duplicated signatures.
    pub fn signatures(&self) -> Vec<&str> {
        self.counts.keys().map(String::as_str).collect()
    }

    /// Number of distinct signatures.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Result of saving a report into a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    /// New rows with a guessed builder.
    pub inserted: usize,
    /// Existing rows that gained the model name.
    pub updated: usize,
}

/// Corpus signature surveyor.
#[derive(Debug, Clone, Default)]
pub struct SignatureInspector {
    options: InspectorOptions,
    cleaner: Option<ContentCleaner>,
}

impl SignatureInspector {
    /// Creates an inspector.
    pub fn new(options: InspectorOptions) -> Self {
        Self {
            options,
            cleaner: None,
        }
    }

    /// Cleans every document with `cleaner` before inspecting it, so the
    /// report shows the signatures the block builder will actually see.
    pub fn with_cleaner(mut self, cleaner: ContentCleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Signatures of one HTML body that are not allow-listed, in document
    /// order with repeats.
    pub fn signatures(&self, html: &str) -> Vec<String> {
        let cleaned;
        let html = match &self.cleaner {
            Some(cleaner) => {
                cleaned = cleaner.clean(html);
                cleaned.as_str()
            }
            None => html,
        };

        parse_elements(html)
            .iter()
            .filter(|element| {
                let root = format!("{}{}", element.name, SEPARATOR);
                !self.options.allow_top_level.contains(&root)
            })
            .map(make_signature)
            .collect()
    }

    /// Inspects a corpus.
    pub fn inspect<'a, I>(&self, documents: I) -> InspectionReport
    where
        I: IntoIterator<Item = &'a SourceDocument>,
    {
        let mut report = InspectionReport::default();
        for document in documents {
            report.documents += 1;
            for signature in self.signatures(&document.content) {
                if !document.model.is_empty() {
                    report
                        .models
                        .entry(signature.clone())
                        .or_default()
                        .insert(document.model.clone());
                }
                *report.counts.entry(signature).or_insert(0) += 1;
            }
        }
        tracing::info!(
            documents = report.documents,
            signatures = report.counts.len(),
            "inspection finished"
        );
        report
    }

    /// Upserts every reported signature into `table`.
    ///
    /// Each signature is recorded against the models of the documents it was
    /// seen in, or against `model` alone when one is given. New signatures get
    /// a guessed builder. Existing rows keep their builder and gain any
    /// missing model names.
    pub fn save(
        report: &InspectionReport,
        model: Option<&str>,
        table: &mut SignatureTable,
    ) -> SaveSummary {
        let mut summary = SaveSummary::default();
        for signature in report.counts.keys() {
            let models: Vec<&str> = match model {
                Some(model) => vec![model],
                None => report
                    .models
                    .get(signature)
                    .map(|models| models.iter().map(String::as_str).collect())
                    .unwrap_or_default(),
            };

            match table.get_mut(signature) {
                Some(entry) => {
                    let mut added = false;
                    for model in &models {
                        added |= entry.add_model(model);
                    }
                    if added {
                        summary.updated += 1;
                    }
                }
                None => {
                    let mut entry =
                        SignatureEntry::new(signature.as_str(), guess_builder(signature));
                    for model in &models {
                        entry.add_model(model);
                    }
                    table.insert(entry);
                    summary.inserted += 1;
                }
            }
        }
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            model = model.unwrap_or("<per document>"),
            "signature table updated"
        );
        summary
    }
}
