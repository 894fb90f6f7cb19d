//! Batch conversion.
//!
//! Documents are independent, so a corpus can be converted across worker
//! threads. Output order always matches input order.

use crate::model::SourceDocument;
use crate::{ConvertedDocument, Converter};
use serde::{Deserialize, Serialize};

/// Batch conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Convert documents in parallel (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BatchOptions {
    /// Creates default options (parallel).
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Converts every document in `documents`.
pub fn convert_all(
    converter: &Converter,
    documents: &[SourceDocument],
    options: BatchOptions,
) -> Vec<ConvertedDocument> {
    let converted = run(converter, documents, options);

    let blocks: usize = converted.iter().map(|d| d.conversion.blocks.len()).sum();
    let diagnostics: usize = converted
        .iter()
        .map(|d| d.conversion.diagnostics.len())
        .sum();
    tracing::info!(
        documents = converted.len(),
        blocks,
        diagnostics,
        parallel = options.parallel,
        "batch converted"
    );

    converted
}

#[cfg(feature = "parallel")]
fn run(
    converter: &Converter,
    documents: &[SourceDocument],
    options: BatchOptions,
) -> Vec<ConvertedDocument> {
    use rayon::prelude::*;

    if options.parallel {
        documents
            .par_iter()
            .map(|document| converter.convert_document(document))
            .collect()
    } else {
        documents
            .iter()
            .map(|document| converter.convert_document(document))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn run(
    converter: &Converter,
    documents: &[SourceDocument],
    _options: BatchOptions,
) -> Vec<ConvertedDocument> {
    documents
        .iter()
        .map(|document| converter.convert_document(document))
        .collect()
}
