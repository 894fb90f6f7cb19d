//! Source documents handed in by the import process.

use serde::{Deserialize, Deserializer, Serialize};

/// One content item (post, page, ...) whose HTML body is to be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Identifier in the source system. Numeric ids are kept as their
    /// decimal string.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    /// Source model name, e.g. `WPPost`.
    #[serde(default)]
    pub model: String,
    /// Raw HTML body.
    #[serde(deserialize_with = "deserialize_content")]
    pub content: String,
}

impl SourceDocument {
    /// Creates a new source document.
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            content: content.into(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}

/// Accepts either a plain string or the REST API shape `{"rendered": "..."}`.
fn deserialize_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Content {
        Plain(String),
        Rendered { rendered: String },
    }

    Ok(match Content::deserialize(deserializer)? {
        Content::Plain(content) => content,
        Content::Rendered { rendered } => rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content() {
        let doc: SourceDocument =
            serde_json::from_str(r#"{"id": "1", "model": "WPPost", "content": "<p>a</p>"}"#)
                .unwrap();
        assert_eq!(doc.content, "<p>a</p>");
        assert_eq!(doc.model, "WPPost");
    }

    #[test]
    fn test_rendered_content() {
        let doc: SourceDocument =
            serde_json::from_str(r#"{"content": {"rendered": "<h2>t</h2>", "protected": false}}"#)
                .unwrap();
        assert_eq!(doc.content, "<h2>t</h2>");
        assert!(doc.id.is_empty());
    }

    #[test]
    fn test_numeric_id() {
        let doc: SourceDocument =
            serde_json::from_str(r#"{"id": 42, "content": ""}"#).unwrap();
        assert_eq!(doc.id, "42");
    }
}
