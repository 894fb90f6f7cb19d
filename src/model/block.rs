//! Stream block definitions.

use serde::{Deserialize, Serialize};

/// A typed unit of page content produced from one HTML fragment.
///
/// Serializes adjacently tagged as `{"type": ..., "value": ...}`, the shape a
/// block-based page editor stores for each stream child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// A heading with its level (`h1`..`h6`).
    Heading(HeadingValue),
    /// A single image.
    Image(ImageValue),
    /// A quotation with optional attribution markup.
    BlockQuote(QuoteValue),
    /// A description (definition) list.
    Description(DescriptionValue),
    /// A serialized `<address>` element.
    Address(String),
    /// A normalized embed URL.
    Embed(String),
    /// Rich text markup. Adjacent rich text blocks are merged.
    RichText(String),
    /// Markup stored verbatim.
    RawHtml(String),
}

impl Block {
    /// Creates a rich text block.
    pub fn rich_text(html: impl Into<String>) -> Self {
        Block::RichText(html.into())
    }

    /// Creates a raw HTML block.
    pub fn raw_html(html: impl Into<String>) -> Self {
        Block::RawHtml(html.into())
    }

    /// Returns the `type` tag used in serialized output.
    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Heading(_) => "heading",
            Block::Image(_) => "image",
            Block::BlockQuote(_) => "block_quote",
            Block::Description(_) => "description",
            Block::Address(_) => "address",
            Block::Embed(_) => "embed",
            Block::RichText(_) => "rich_text",
            Block::RawHtml(_) => "raw_html",
        }
    }
}

/// Value of a heading block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingValue {
    pub text: String,
    pub importance: String,
}

/// Value of an image block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageValue {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

/// Value of a block quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteValue {
    pub quote: String,
    pub attribution: String,
}

/// Value of a description list block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DescriptionValue {
    pub items: Vec<DescriptionItem>,
}

/// One term/description pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionItem {
    pub term: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heading_json_shape() {
        let block = Block::Heading(HeadingValue {
            text: "Title".into(),
            importance: "h2".into(),
        });
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "heading", "value": {"text": "Title", "importance": "h2"}})
        );
    }

    #[test]
    fn test_string_valued_blocks() {
        let block = Block::rich_text("<p>a</p>");
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "rich_text", "value": "<p>a</p>"})
        );

        let block = Block::Embed("https://youtu.be/x".into());
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "embed", "value": "https://youtu.be/x"})
        );
    }

    #[test]
    fn test_block_type_matches_serde_tag() {
        let blocks = vec![
            Block::rich_text(""),
            Block::raw_html(""),
            Block::Address(String::new()),
            Block::Description(DescriptionValue::default()),
        ];
        for block in blocks {
            let value = serde_json::to_value(&block).unwrap();
            assert_eq!(value["type"], block.block_type());
        }
    }

    #[test]
    fn test_deserialize_block_list() {
        let json = r#"[
            {"type": "block_quote", "value": {"quote": "Q", "attribution": ""}},
            {"type": "raw_html", "value": "<table></table>"}
        ]"#;
        let blocks: Vec<Block> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::BlockQuote(_)));
        assert_eq!(blocks[1], Block::raw_html("<table></table>"));
    }
}
