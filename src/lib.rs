//! # wpblocks
//!
//! Converts WordPress post HTML into typed stream blocks for a block-based
//! page editor.
//!
//! ## Pipeline
//!
//! 1. **Signatures** ([`signature`]): every top-level HTML fragment is
//!    classified by the tag names along its first-child spine, e.g.
//!    `div:p:strong:`.
//! 2. **Cleaning** ([`cleaner`]): signature-prefix rules strip layout
//!    wrappers and flatten stray markup so fragments either fit in rich text
//!    or match a block builder.
//! 3. **Building** ([`builder`]): exact signatures are looked up in a
//!    [`SignatureTable`] naming the builder function for each fragment.
//!    Adjacent rich text is merged.
//!
//! The [`inspect`] module surveys a corpus to find the signatures a table
//! needs, and [`batch`] converts whole corpora.
//!
//! ## Quick Start
//!
//! ```
//! use wpblocks::{SignatureEntry, SignatureTable, WpBlocks};
//! use wpblocks::model::Block;
//!
//! let mut table = SignatureTable::new();
//! table.insert(SignatureEntry::new("p:", "rich_text"));
//! table.insert(SignatureEntry::new("h2:", "heading"));
//!
//! let converter = WpBlocks::new().with_table(table).converter()?;
//! let conversion = converter.convert("<div><p>Hello</p></div><h2>Title</h2>");
//!
//! assert_eq!(conversion.blocks[0], Block::rich_text("<p>Hello</p>"));
//! assert_eq!(conversion.blocks[1].block_type(), "heading");
//! # Ok::<(), wpblocks::Error>(())
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): parallel batch conversion with rayon

pub mod batch;
pub mod builder;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod inspect;
pub mod model;
pub mod signature;
pub mod table;

// Re-exports
pub use batch::{convert_all, BatchOptions};
pub use builder::{
    BlockBuilder, BuildOptions, BuildReport, BuilderRegistry, Diagnostic, DiagnosticKind,
    UnmatchedPolicy,
};
pub use cleaner::{
    unwrap_tags, CleanAction, CleanReport, CleanerOptions, CleaningRules, ContentCleaner,
};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use inspect::{InspectionReport, InspectorOptions, SaveSummary, SignatureInspector};
pub use model::{Block, SourceDocument};
pub use signature::{make_signature, SignatureMaker, SignatureMode};
pub use table::{SignatureEntry, SignatureTable};

use serde::{Deserialize, Serialize};

/// Returns the distinct signatures of an HTML body in document order.
///
/// # Example
///
/// ```
/// let html = r##"<div><p><a href="#">Link</a></p></div>
///                <ul><li><a href="#">Link</a></li></ul>
///                <div><p><a href="#">Link</a></p></div>"##;
/// assert_eq!(wpblocks::signatures(html), vec!["div:p:a:", "ul:li:a:"]);
/// ```
pub fn signatures(html: &str) -> Vec<String> {
    SignatureMaker::new().signatures(html)
}

/// Cleans an HTML body with `rules` and default cleaner options.
pub fn clean(html: &str, rules: &CleaningRules) -> String {
    ContentCleaner::new(rules.clone(), CleanerOptions::default()).clean(html)
}

/// Builds blocks from already cleaned HTML using the built-in builders.
///
/// Fails only if `table` names an unknown builder.
pub fn build(html: &str, table: &SignatureTable) -> Result<Vec<Block>> {
    let builder = BlockBuilder::new(
        table,
        &BuilderRegistry::with_defaults(),
        BuildOptions::default(),
    )?;
    Ok(builder.build(html))
}

/// Builder for a [`Converter`].
///
/// Provides a fluent API for configuring the pipeline.
///
/// # Example
///
/// ```
/// use wpblocks::{CleaningRules, SignatureTable, WpBlocks};
///
/// let rules = CleaningRules::from_table([("div:", vec!["unwrap(div)"])])?;
/// let converter = WpBlocks::new()
///     .with_rules(rules)
///     .with_table(SignatureTable::new())
///     .with_fallback("raw_html")
///     .converter()?;
///
/// let conversion = converter.convert("<div><table><tr><td>1</td></tr></table></div>");
/// assert_eq!(conversion.blocks[0].block_type(), "raw_html");
/// # Ok::<(), wpblocks::Error>(())
/// ```
pub struct WpBlocks {
    rules: CleaningRules,
    cleaner_options: CleanerOptions,
    build_options: BuildOptions,
    table: SignatureTable,
    registry: BuilderRegistry,
}

impl Default for WpBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl WpBlocks {
    /// Creates a builder with the WordPress cleaning preset, an empty
    /// signature table and the built-in builders.
    pub fn new() -> Self {
        Self {
            rules: CleaningRules::wordpress(),
            cleaner_options: CleanerOptions::default(),
            build_options: BuildOptions::default(),
            table: SignatureTable::new(),
            registry: BuilderRegistry::with_defaults(),
        }
    }

    /// Creates a builder from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            rules: config.cleaning_rules()?,
            cleaner_options: config.cleaning.options.clone(),
            build_options: config.building.clone(),
            ..Self::new()
        })
    }

    /// Sets the cleaning rules.
    pub fn with_rules(mut self, rules: CleaningRules) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the cleaner options.
    pub fn with_cleaner_options(mut self, options: CleanerOptions) -> Self {
        self.cleaner_options = options;
        self
    }

    /// Sets the signature table.
    pub fn with_table(mut self, table: SignatureTable) -> Self {
        self.table = table;
        self
    }

    /// Sets the builder registry.
    pub fn with_registry(mut self, registry: BuilderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Builds unmatched fragments with `builder` instead of skipping them.
    pub fn with_fallback(mut self, builder: impl Into<String>) -> Self {
        self.build_options = self.build_options.with_fallback(builder);
        self
    }

    /// Resolves every rule and table entry into a [`Converter`].
    pub fn converter(self) -> Result<Converter> {
        let builder = BlockBuilder::new(&self.table, &self.registry, self.build_options)?;
        let cleaner = ContentCleaner::new(self.rules, self.cleaner_options);
        Ok(Converter::new(cleaner, builder))
    }
}

/// Result of converting one HTML body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// The cleaned HTML the blocks were built from.
    pub cleaned: String,
    pub blocks: Vec<Block>,
    /// Fragments the builder skipped or rejected.
    pub diagnostics: Vec<Diagnostic>,
    /// Signatures no cleaning rule matched.
    pub unmatched: Vec<String>,
}

/// A converted source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub id: String,
    pub model: String,
    #[serde(flatten)]
    pub conversion: Conversion,
}

/// The clean-then-build pipeline.
///
/// Holds only resolved, read-only tables, so one converter can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Converter {
    cleaner: ContentCleaner,
    builder: BlockBuilder,
}

impl Converter {
    /// Creates a converter from its two stages.
    pub fn new(cleaner: ContentCleaner, builder: BlockBuilder) -> Self {
        Self { cleaner, builder }
    }

    /// Returns the cleaning stage.
    pub fn cleaner(&self) -> &ContentCleaner {
        &self.cleaner
    }

    /// Returns the building stage.
    pub fn builder(&self) -> &BlockBuilder {
        &self.builder
    }

    /// Cleans and builds one HTML body.
    pub fn convert(&self, html: &str) -> Conversion {
        let cleaned = self.cleaner.clean_report(html);
        let built = self.builder.build_report(&cleaned.html);
        Conversion {
            cleaned: cleaned.html,
            blocks: built.blocks,
            diagnostics: built.diagnostics,
            unmatched: cleaned.unmatched,
        }
    }

    /// Converts a source document.
    pub fn convert_document(&self, document: &SourceDocument) -> ConvertedDocument {
        tracing::debug!(id = %document.id, model = %document.model, "converting document");
        ConvertedDocument {
            id: document.id.clone(),
            model: document.model.clone(),
            conversion: self.convert(&document.content),
        }
    }
}
