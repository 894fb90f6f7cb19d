//! Builder name registry.

use super::functions;
use crate::model::Block;
use std::collections::HashMap;
use std::fmt;

/// Keyword arguments attached to a signature table entry.
pub type Kwargs = serde_json::Map<String, serde_json::Value>;

/// What a builder knows about the fragment besides its markup.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Signature of the fragment.
    pub signature: &'a str,
    /// Keyword arguments from the table entry.
    pub kwargs: &'a Kwargs,
}

/// A builder function.
pub type BuilderFn = fn(&str, &BuildContext<'_>) -> Option<Block>;

/// Legacy names accepted in tables, after suffix stripping.
const ALIASES: &[(&str, &str)] = &[
    ("richtext", "rich_text"),
    ("blockquote", "block_quote"),
    ("rawhtml", "raw_html"),
    ("definition", "description"),
];

/// Reduces a builder reference to its registry key: dotted paths resolve by
/// their last segment, a `_block_builder` suffix is dropped and legacy
/// aliases are mapped to their current names.
///
/// ```
/// use wpblocks::builder::canonical_name;
///
/// assert_eq!(
///     canonical_name("wagtail_toolbox.wordpress.wagtail_builder_utils.raw_html"),
///     "raw_html"
/// );
/// assert_eq!(canonical_name("richtext_block_builder"), "rich_text");
/// ```
pub fn canonical_name(reference: &str) -> &str {
    let name = reference.trim();
    let name = name.rsplit('.').next().unwrap_or(name);
    let name = name.strip_suffix("_block_builder").unwrap_or(name);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
        .unwrap_or(name)
}

/// Maps builder names to functions.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<String, BuilderFn>,
}

impl BuilderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in builder.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("heading", functions::heading)
            .register("block_quote", functions::block_quote)
            .register("embed", functions::embed)
            .register("description", functions::description)
            .register("address", functions::address)
            .register("image", functions::image)
            .register("figure", functions::figure)
            .register("title", functions::title)
            .register("pre", functions::pre)
            .register("table", functions::table)
            .register("form", functions::form)
            .register("rich_text", functions::rich_text)
            .register("raw_html", functions::raw_html)
            .register("null", functions::null);
        registry
    }

    /// Registers a builder under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, builder: BuilderFn) -> &mut Self {
        self.builders.insert(name.into(), builder);
        self
    }

    /// Resolves a builder reference.
    pub fn resolve(&self, reference: &str) -> Option<BuilderFn> {
        self.builders
            .get(reference.trim())
            .or_else(|| self.builders.get(canonical_name(reference)))
            .copied()
    }

    /// Returns true if `reference` resolves.
    pub fn contains(&self, reference: &str) -> bool {
        self.resolve(reference).is_some()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("builders", &self.names())
            .finish()
    }
}
