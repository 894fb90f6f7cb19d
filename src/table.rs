//! Signature table.
//!
//! The block-building lookup table: one entry per exact signature naming the
//! builder to run, optional keyword arguments, the source models the
//! signature was seen in and free-form notes. Stored as a JSON array sorted
//! by signature.

use crate::builder::Kwargs;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Separator between model names in [`SignatureEntry::model`].
pub const MODEL_SEPARATOR: char = ',';

/// One row of the signature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub signature: String,
    /// Builder reference, resolved through a
    /// [`BuilderRegistry`](crate::builder::BuilderRegistry).
    pub builder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Kwargs>,
    /// Comma-separated source model names.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl SignatureEntry {
    /// Creates an entry.
    pub fn new(signature: impl Into<String>, builder: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            builder: builder.into(),
            kwargs: None,
            model: String::new(),
            notes: String::new(),
        }
    }

    /// Sets keyword arguments.
    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = Some(kwargs);
        self
    }

    /// Sets the model list.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Iterates over the tracked model names.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.model
            .split(MODEL_SEPARATOR)
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// Records `model` as a user of this signature. Returns false if it was
    /// already tracked.
    pub fn add_model(&mut self, model: &str) -> bool {
        let model = model.trim();
        if model.is_empty() || self.models().any(|m| m == model) {
            return false;
        }
        if !self.model.trim().is_empty() {
            self.model.push(MODEL_SEPARATOR);
        }
        self.model.push_str(model);
        true
    }
}

/// Exact-signature lookup table with upsert semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureTable {
    entries: BTreeMap<String, SignatureEntry>,
}

impl SignatureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parses a table from a JSON array of entries. Later duplicates replace
    /// earlier ones.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<SignatureEntry> = serde_json::from_str(json)?;
        Ok(entries.into_iter().collect())
    }

    /// Serializes the table as a pretty JSON array sorted by signature.
    pub fn to_json_string(&self) -> Result<String> {
        let entries: Vec<&SignatureEntry> = self.entries.values().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Writes the table to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut json = self.to_json_string()?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }

    /// Returns the entry for an exact signature.
    pub fn get(&self, signature: &str) -> Option<&SignatureEntry> {
        self.entries.get(signature)
    }

    /// Returns a mutable entry for an exact signature.
    pub fn get_mut(&mut self, signature: &str) -> Option<&mut SignatureEntry> {
        self.entries.get_mut(signature)
    }

    /// Returns true if the signature has an entry.
    pub fn contains(&self, signature: &str) -> bool {
        self.entries.contains_key(signature)
    }

    /// Inserts or replaces an entry, returning the previous one.
    pub fn insert(&mut self, entry: SignatureEntry) -> Option<SignatureEntry> {
        self.entries.insert(entry.signature.clone(), entry)
    }

    /// Removes an entry.
    pub fn remove(&mut self, signature: &str) -> Option<SignatureEntry> {
        self.entries.remove(signature)
    }

    /// Iterates over entries in signature order.
    pub fn iter(&self) -> impl Iterator<Item = &SignatureEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SignatureEntry> for SignatureTable {
    fn from_iter<I: IntoIterator<Item = SignatureEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_add_model_tracks_once() {
        let mut entry = SignatureEntry::new("div:p:", "rich_text");
        assert!(entry.add_model("WPPost"));
        assert!(entry.add_model("WPPage"));
        assert!(!entry.add_model("WPPost"));
        assert!(!entry.add_model("  "));
        assert_eq!(entry.model, "WPPost,WPPage");
        assert_eq!(entry.models().collect::<Vec<_>>(), vec!["WPPost", "WPPage"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = SignatureTable::new();
        assert!(table.insert(SignatureEntry::new("p:", "rich_text")).is_none());
        let previous = table.insert(SignatureEntry::new("p:", "raw_html")).unwrap();
        assert_eq!(previous.builder, "rich_text");
        assert_eq!(table.get("p:").unwrap().builder, "raw_html");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut table: SignatureTable = [
            SignatureEntry::new("p:", "rich_text"),
            SignatureEntry::new("h2:", "heading"),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.remove("h2:").unwrap().builder, "heading");
        assert!(table.remove("h2:").is_none());
        assert!(!table.contains("h2:"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_json_shape_is_sorted_and_sparse() {
        let table: SignatureTable = [
            SignatureEntry::new("table:tbody:", "table"),
            SignatureEntry::new("blockquote:p:", "block_quote")
                .with_kwargs(json!({"preserve_markup": true}).as_object().cloned().unwrap())
                .with_model("WPPost"),
        ]
        .into_iter()
        .collect();

        let value: serde_json::Value =
            serde_json::from_str(&table.to_json_string().unwrap()).unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "signature": "blockquote:p:",
                    "builder": "block_quote",
                    "kwargs": {"preserve_markup": true},
                    "model": "WPPost"
                },
                {"signature": "table:tbody:", "builder": "table"}
            ])
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signatures.json");

        let mut table = SignatureTable::new();
        table.insert(SignatureEntry::new("h2:", "heading").with_notes("section titles"));
        table.insert(SignatureEntry::new("dl:dt:", "description"));
        table.save(&path).unwrap();

        let loaded = SignatureTable::load(&path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.get("h2:").unwrap().notes, "section titles");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = SignatureTable::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        assert!(matches!(
            SignatureTable::from_json_str("{\"signature\": 1}"),
            Err(crate::Error::Json(_))
        ));
    }
}
