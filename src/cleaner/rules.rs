//! Cleaning rule table.

use super::actions::CleanAction;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// One rule: a signature prefix and the actions applied on a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningRule {
    /// Signature prefix this rule matches.
    pub prefix: String,
    /// Actions applied in order, each to the previous action's output.
    pub actions: Vec<CleanAction>,
}

/// Signature-prefix → action pipeline table.
///
/// When several prefixes match a signature the longest one wins, so a
/// broad `div:` rule can coexist with a specific `div:p:strong:` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningRules {
    rules: Vec<CleaningRule>,
}

impl CleaningRules {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from symbolic action references, resolving every
    /// reference up front.
    ///
    /// # Example
    ///
    /// ```
    /// use wpblocks::cleaner::CleaningRules;
    ///
    /// let rules = CleaningRules::from_table([
    ///     ("div:p:", vec!["promote_content"]),
    ///     ("div:", vec!["convert_to_paragraph"]),
    /// ])?;
    /// assert_eq!(rules.len(), 2);
    /// # Ok::<(), wpblocks::Error>(())
    /// ```
    pub fn from_table<I, K, A, S>(table: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, A)>,
        K: Into<String>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::new();
        for (prefix, references) in table {
            let prefix = prefix.into();
            let actions = references
                .into_iter()
                .map(|reference| {
                    reference.as_ref().parse::<CleanAction>().map_err(|err| match err {
                        Error::UnknownAction { name, .. } => Error::UnknownAction {
                            prefix: prefix.clone(),
                            name,
                        },
                        other => other,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rules.insert(prefix, actions)?;
        }
        Ok(rules)
    }

    /// Adds or replaces the rule for `prefix`.
    pub fn insert(&mut self, prefix: impl Into<String>, actions: Vec<CleanAction>) -> Result<()> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::InvalidConfig(
                "cleaning rule prefix must not be empty".into(),
            ));
        }
        if actions.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "cleaning rule '{}' has no actions",
                prefix
            )));
        }

        match self.rules.iter_mut().find(|rule| rule.prefix == prefix) {
            Some(rule) => rule.actions = actions,
            None => self.rules.push(CleaningRule { prefix, actions }),
        }
        Ok(())
    }

    /// Returns the most specific rule whose prefix starts `signature`.
    pub fn find(&self, signature: &str) -> Option<&CleaningRule> {
        self.rules
            .iter()
            .filter(|rule| signature.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.len())
    }

    /// Iterates over rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CleaningRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the table in its symbolic form.
    pub fn to_table(&self) -> BTreeMap<String, Vec<String>> {
        self.rules
            .iter()
            .map(|rule| {
                (
                    rule.prefix.clone(),
                    rule.actions.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }

    /// Rules for typical block-editor (Gutenberg) output: layout wrappers
    /// are stripped, bare `div`s become paragraphs, and content that needs a
    /// dedicated block is left alone for the builder.
    pub fn wordpress() -> Self {
        let promote = || vec![CleanAction::promote_content()];
        let paragraph = || vec![CleanAction::MakeParagraph];
        let keep = || vec![CleanAction::DontClean];

        let table: Vec<(&str, Vec<CleanAction>)> = vec![
            ("address:", keep()),
            ("audio:", keep()),
            ("blockquote:", keep()),
            ("div:", paragraph()),
            ("div:a:", paragraph()),
            ("div:div:", promote()),
            ("div:figure:", promote()),
            ("div:label:", promote()),
            ("div:p:", promote()),
            ("div:table:", promote()),
            ("div:video:", promote()),
            ("dl:", keep()),
            ("figure:", keep()),
            ("form:", keep()),
            ("h1:", keep()),
            ("pre:", keep()),
            ("table:", keep()),
        ];

        let mut rules = Self::new();
        for (prefix, actions) in table {
            rules.rules.push(CleaningRule {
                prefix: prefix.to_string(),
                actions,
            });
        }
        rules
    }
}
