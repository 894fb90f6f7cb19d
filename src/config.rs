//! Pipeline configuration.
//!
//! One JSON document configures every stage:
//!
//! ```json
//! {
//!   "cleaning": {
//!     "rules": {"div:p:": ["promote_content"]},
//!     "richtext_tags": ["p", "h2"],
//!     "signature_mode": "descendants"
//!   },
//!   "building": {"unmatched": {"fallback": "raw_html"}},
//!   "inspector": {"allow_top_level": ["p:"]}
//! }
//! ```
//!
//! Every section and field is optional. Without `rules` the
//! [`CleaningRules::wordpress`] preset is used.

use crate::builder::{BlockBuilder, BuildOptions, BuilderRegistry};
use crate::cleaner::{CleanerOptions, CleaningRules, ContentCleaner};
use crate::error::Result;
use crate::inspect::{InspectorOptions, SignatureInspector};
use crate::table::SignatureTable;
use crate::Converter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Cleaner section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Signature prefix → action references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<BTreeMap<String, Vec<String>>>,
    #[serde(flatten)]
    pub options: CleanerOptions,
}

/// Whole-pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub building: BuildOptions,
    pub inspector: InspectorOptions,
}

impl PipelineConfig {
    /// Loads configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parses configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.cleaning_rules()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolves the cleaning rule table.
    pub fn cleaning_rules(&self) -> Result<CleaningRules> {
        match &self.cleaning.rules {
            Some(table) => CleaningRules::from_table(table),
            None => Ok(CleaningRules::wordpress()),
        }
    }

    /// Builds the content cleaner.
    pub fn cleaner(&self) -> Result<ContentCleaner> {
        Ok(ContentCleaner::new(
            self.cleaning_rules()?,
            self.cleaning.options.clone(),
        ))
    }

    /// Builds a block builder over `table` using the built-in builders.
    pub fn block_builder(&self, table: &SignatureTable) -> Result<BlockBuilder> {
        BlockBuilder::new(table, &BuilderRegistry::with_defaults(), self.building.clone())
    }

    /// Builds the signature inspector. With `clean`, documents are cleaned
    /// before inspection.
    pub fn inspector(&self, clean: bool) -> Result<SignatureInspector> {
        let inspector = SignatureInspector::new(self.inspector.clone());
        if clean {
            Ok(inspector.with_cleaner(self.cleaner()?))
        } else {
            Ok(inspector)
        }
    }

    /// Builds the full converter over `table`.
    pub fn converter(&self, table: &SignatureTable) -> Result<Converter> {
        Ok(Converter::new(self.cleaner()?, self.block_builder(table)?))
    }
}
