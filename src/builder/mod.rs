//! # Block Builder
//!
//! Turns cleaned HTML into an ordered list of [`Block`]s. Each top-level
//! fragment's signature is looked up exactly in a [`SignatureTable`]; the
//! entry names a builder function which either returns a block or rejects
//! the fragment. Adjacent rich text blocks are merged.
//!
//! ```
//! use wpblocks::builder::{BlockBuilder, BuildOptions, BuilderRegistry};
//! use wpblocks::model::Block;
//! use wpblocks::table::{SignatureEntry, SignatureTable};
//!
//! let mut table = SignatureTable::new();
//! table.insert(SignatureEntry::new("p:", "rich_text"));
//! table.insert(SignatureEntry::new("h2:", "heading"));
//!
//! let registry = BuilderRegistry::with_defaults();
//! let builder = BlockBuilder::new(&table, &registry, BuildOptions::default())?;
//! let blocks = builder.build("<p>a</p><p>b</p><h2>Title</h2>");
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(blocks[0], Block::rich_text("<p>a</p><p>b</p>"));
//! # Ok::<(), wpblocks::Error>(())
//! ```

mod functions;
mod registry;

pub use functions::{
    address, block_quote, description, embed, figure, form, heading, image, normalize_embed_url,
    null, pre, raw_html, rich_text, table, title, PRESERVE_MARKUP_SIGNATURES,
};
pub use registry::{canonical_name, BuildContext, BuilderFn, BuilderRegistry, Kwargs};

use crate::error::{Error, Result};
use crate::model::{parse_elements, Block};
use crate::signature::make_signature;
use crate::table::SignatureTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with fragments whose signature is not in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Drop the fragment.
    #[default]
    Skip,
    /// Build the fragment with the named builder.
    Fallback(String),
}

/// Block builder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Policy for signatures missing from the table.
    pub unmatched: UnmatchedPolicy,
}

impl BuildOptions {
    /// Creates default options (unmatched fragments are skipped).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unmatched policy.
    pub fn with_unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Builds unmatched fragments with `builder` instead of skipping them.
    pub fn with_fallback(self, builder: impl Into<String>) -> Self {
        self.with_unmatched(UnmatchedPolicy::Fallback(builder.into()))
    }
}

/// Why a fragment produced no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The signature has no table entry.
    NotFound,
    /// The builder returned nothing.
    Rejected,
}

/// A fragment-level problem found while building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub signature: String,
    pub kind: DiagnosticKind,
    /// Builder that rejected the fragment, if one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
}

/// Blocks plus the diagnostics collected while building them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
struct ResolvedBuilder {
    name: String,
    builder: BuilderFn,
    kwargs: Kwargs,
}

/// Signature-table driven block builder.
///
/// Every builder reference is resolved on construction, so a table that
/// names an unknown builder is rejected up front rather than per fragment.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    entries: HashMap<String, ResolvedBuilder>,
    fallback: Option<ResolvedBuilder>,
}

impl BlockBuilder {
    /// Resolves `table` against `registry`.
    pub fn new(
        table: &SignatureTable,
        registry: &BuilderRegistry,
        options: BuildOptions,
    ) -> Result<Self> {
        let mut entries = HashMap::with_capacity(table.len());
        for entry in table.iter() {
            let builder = registry
                .resolve(&entry.builder)
                .ok_or_else(|| Error::UnknownBuilder {
                    signature: entry.signature.clone(),
                    name: entry.builder.clone(),
                })?;
            entries.insert(
                entry.signature.clone(),
                ResolvedBuilder {
                    name: canonical_name(&entry.builder).to_string(),
                    builder,
                    kwargs: entry.kwargs.clone().unwrap_or_default(),
                },
            );
        }

        let fallback = match options.unmatched {
            UnmatchedPolicy::Skip => None,
            UnmatchedPolicy::Fallback(name) => {
                let builder = registry.resolve(&name).ok_or_else(|| Error::UnknownBuilder {
                    signature: String::new(),
                    name: name.clone(),
                })?;
                Some(ResolvedBuilder {
                    name: canonical_name(&name).to_string(),
                    builder,
                    kwargs: Kwargs::new(),
                })
            }
        };

        Ok(Self { entries, fallback })
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds blocks from `html`, discarding diagnostics.
    pub fn build(&self, html: &str) -> Vec<Block> {
        self.build_report(html).blocks
    }

    /// Builds blocks from `html` and reports every skipped fragment.
    pub fn build_report(&self, html: &str) -> BuildReport {
        let mut report = BuildReport::default();

        for element in parse_elements(html) {
            let signature = make_signature(&element);

            let resolved = match self.entries.get(&signature) {
                Some(resolved) => resolved,
                None => {
                    tracing::warn!(signature = %signature, "signature not found");
                    report.diagnostics.push(Diagnostic {
                        signature: signature.clone(),
                        kind: DiagnosticKind::NotFound,
                        builder: None,
                    });
                    match &self.fallback {
                        Some(fallback) => fallback,
                        None => continue,
                    }
                }
            };

            let ctx = BuildContext {
                signature: &signature,
                kwargs: &resolved.kwargs,
            };
            match (resolved.builder)(&element.to_html(), &ctx) {
                Some(block) => merge_block(&mut report.blocks, block),
                None => {
                    tracing::debug!(
                        signature = %signature,
                        builder = %resolved.name,
                        "fragment rejected"
                    );
                    report.diagnostics.push(Diagnostic {
                        signature,
                        kind: DiagnosticKind::Rejected,
                        builder: Some(resolved.name.clone()),
                    });
                }
            }
        }

        report
    }
}

/// Appends `block`, folding it into the previous block when both are rich
/// text.
pub fn merge_block(blocks: &mut Vec<Block>, block: Block) {
    if let Block::RichText(next) = &block {
        if let Some(Block::RichText(previous)) = blocks.last_mut() {
            previous.push_str(next);
            return;
        }
    }
    blocks.push(block);
}

/// Merges runs of adjacent rich text blocks.
pub fn merge_blocks(blocks: impl IntoIterator<Item = Block>) -> Vec<Block> {
    let mut merged = Vec::new();
    for block in blocks {
        merge_block(&mut merged, block);
    }
    merged
}
