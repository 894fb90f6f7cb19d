//! Builder functions.
//!
//! Every builder receives the serialized fragment and a [`BuildContext`] and
//! returns a block, or `None` when the fragment is ambiguous. Ambiguous means
//! the fragment does not contain exactly one of the elements the builder
//! knows how to read.

use super::registry::BuildContext;
use crate::model::{
    find_all, parse_elements, Block, DescriptionItem, DescriptionValue, Element, HeadingValue,
    ImageValue, QuoteValue,
};
use regex::Regex;
use std::sync::LazyLock;

/// Signatures whose first quote child is kept as markup instead of text.
pub const PRESERVE_MARKUP_SIGNATURES: &[&str] = &[
    "blockquote:p:",
    "blockquote:p:br:",
    "blockquote:p:strong:code:",
    "blockquote:p:strong:em:a:",
    "blockquote:p:cite:",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

static RE_YOUTUBE_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?:)?//(?:www\.)?youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]+)")
        .unwrap()
});

/// Returns the single element named in `names`, or `None` if there are zero
/// or several.
fn exactly_one(html: &str, names: &[&str]) -> Option<Element> {
    let elements = parse_elements(html);
    match find_all(&elements, names).as_slice() {
        [element] => Some((*element).clone()),
        _ => None,
    }
}

/// `<hN>` → heading block.
pub fn heading(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    let element = exactly_one(html, HEADING_TAGS)?;
    Some(Block::Heading(HeadingValue {
        text: element.text(),
        importance: element.name,
    }))
}

/// `<blockquote>` → block quote.
///
/// The quote keeps its first child's markup when the signature is one of
/// [`PRESERVE_MARKUP_SIGNATURES`], or when `preserve_markup` is set in the
/// kwargs. Otherwise it is the plain text of the quote.
pub fn block_quote(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    let element = exactly_one(html, &["blockquote"])?;

    let preserve = ctx
        .kwargs
        .get("preserve_markup")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or_else(|| PRESERVE_MARKUP_SIGNATURES.contains(&ctx.signature));

    let quote = match element.first_element_child() {
        Some(child) if preserve => child.to_html(),
        _ => element.text(),
    };

    let attribution = match element.find("cite") {
        Some(cite) => cite.to_html(),
        None => element.attr("cite").unwrap_or_default().to_string(),
    };

    Some(Block::BlockQuote(QuoteValue { quote, attribution }))
}

/// `<iframe src>` → embed URL.
pub fn embed(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    let element = exactly_one(html, &["iframe"])?;
    let src = element.attr("src")?;
    Some(Block::Embed(normalize_embed_url(src)))
}

/// Rewrites YouTube embed URLs to their short share form.
///
/// ```
/// use wpblocks::builder::normalize_embed_url;
///
/// assert_eq!(
///     normalize_embed_url("https://www.youtube.com/embed/XYZ?x=1"),
///     "https://youtu.be/XYZ"
/// );
/// assert_eq!(
///     normalize_embed_url("https://player.vimeo.com/video/1"),
///     "https://player.vimeo.com/video/1"
/// );
/// ```
pub fn normalize_embed_url(src: &str) -> String {
    match RE_YOUTUBE_EMBED.captures(src.trim()) {
        Some(caps) => format!("https://youtu.be/{}", &caps[1]),
        None => src.to_string(),
    }
}

/// `<dl>` → description list. Each `dt` is paired with the next `dd`
/// sibling; terms without one are skipped.
pub fn description(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    let list = exactly_one(html, &["dl"])?;
    list.find("dt")?;

    let mut items = Vec::new();
    for parent in list.self_and_descendants() {
        let children: Vec<&Element> = parent.element_children().collect();
        for (index, child) in children.iter().enumerate() {
            if child.name != "dt" {
                continue;
            }
            if let Some(dd) = children[index + 1..].iter().find(|e| e.name == "dd") {
                items.push(DescriptionItem {
                    term: child.text(),
                    description: dd.text(),
                });
            }
        }
    }

    if items.is_empty() {
        return None;
    }
    Some(Block::Description(DescriptionValue { items }))
}

/// `<address>` → the serialized element.
pub fn address(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    let element = exactly_one(html, &["address"])?;
    Some(Block::Address(element.to_html()))
}

/// `<img src>` → image block, with the text of a `figcaption` as caption.
pub fn image(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    let elements = parse_elements(html);
    let img = match find_all(&elements, &["img"]).as_slice() {
        [img] => *img,
        _ => return None,
    };
    let src = img.attr("src")?;

    let caption = find_all(&elements, &["figcaption"])
        .first()
        .map(|figcaption| figcaption.text().trim().to_string())
        .unwrap_or_default();

    Some(Block::Image(ImageValue {
        src: src.to_string(),
        alt: img.attr("alt").unwrap_or_default().to_string(),
        caption,
    }))
}

/// Stores the fragment as raw HTML.
pub fn raw_html(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    Some(Block::raw_html(html))
}

/// Stores a figure as raw HTML.
pub fn figure(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    raw_html(html, ctx)
}

/// Stores a title as raw HTML.
pub fn title(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    raw_html(html, ctx)
}

/// Stores preformatted text as raw HTML.
pub fn pre(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    raw_html(html, ctx)
}

/// Stores a table as raw HTML.
pub fn table(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    raw_html(html, ctx)
}

/// Stores a form as raw HTML.
pub fn form(html: &str, ctx: &BuildContext<'_>) -> Option<Block> {
    raw_html(html, ctx)
}

/// Stores the fragment as rich text.
pub fn rich_text(html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    Some(Block::rich_text(html))
}

/// Drops the fragment.
pub fn null(_html: &str, _ctx: &BuildContext<'_>) -> Option<Block> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Kwargs;
    use serde_json::json;

    fn ctx<'a>(signature: &'a str, kwargs: &'a Kwargs) -> BuildContext<'a> {
        BuildContext { signature, kwargs }
    }

    #[test]
    fn test_heading_single() {
        let kwargs = Kwargs::new();
        let block = heading("<h2>Getting <em>started</em></h2>", &ctx("h2:em:", &kwargs));
        assert_eq!(
            block,
            Some(Block::Heading(HeadingValue {
                text: "Getting started".into(),
                importance: "h2".into(),
            }))
        );
    }

    #[test]
    fn test_heading_nested_in_wrapper() {
        let kwargs = Kwargs::new();
        let block = heading("<div><h4>Deep</h4></div>", &ctx("div:h4:", &kwargs)).unwrap();
        assert!(matches!(block, Block::Heading(ref v) if v.importance == "h4"));
    }

    #[test]
    fn test_heading_ambiguous() {
        let kwargs = Kwargs::new();
        assert_eq!(heading("<p>none</p>", &ctx("p:", &kwargs)), None);
        assert_eq!(
            heading("<div><h2>a</h2><h3>b</h3></div>", &ctx("div:h2:", &kwargs)),
            None
        );
    }

    #[test]
    fn test_block_quote_preserves_markup() {
        let kwargs = Kwargs::new();
        let block = block_quote(
            "<blockquote><p>Q</p></blockquote>",
            &ctx("blockquote:p:", &kwargs),
        );
        assert_eq!(
            block,
            Some(Block::BlockQuote(QuoteValue {
                quote: "<p>Q</p>".into(),
                attribution: String::new(),
            }))
        );
    }

    #[test]
    fn test_block_quote_cite_element() {
        let kwargs = Kwargs::new();
        let block = block_quote(
            "<blockquote><p>Q</p><cite>A</cite></blockquote>",
            &ctx("blockquote:p:", &kwargs),
        )
        .unwrap();
        match block {
            Block::BlockQuote(value) => {
                assert_eq!(value.quote, "<p>Q</p>");
                assert_eq!(value.attribution, "<cite>A</cite>");
            }
            other => panic!("Expected block quote, got {other:?}"),
        }
    }

    #[test]
    fn test_block_quote_cite_attribute_and_plain_text() {
        let kwargs = Kwargs::new();
        let block = block_quote(
            r#"<blockquote cite="https://example.com"><div>Said <b>this</b></div></blockquote>"#,
            &ctx("blockquote:div:b:", &kwargs),
        )
        .unwrap();
        assert_eq!(
            block,
            Block::BlockQuote(QuoteValue {
                quote: "Said this".into(),
                attribution: "https://example.com".into(),
            })
        );
    }

    #[test]
    fn test_block_quote_kwargs_override() {
        let kwargs = json!({"preserve_markup": false});
        let kwargs = kwargs.as_object().unwrap();
        let block = block_quote(
            "<blockquote><p>Q <em>e</em></p></blockquote>",
            &ctx("blockquote:p:", kwargs),
        )
        .unwrap();
        assert!(matches!(block, Block::BlockQuote(ref v) if v.quote == "Q e"));
    }

    #[test]
    fn test_block_quote_ambiguous() {
        let kwargs = Kwargs::new();
        let html = "<div><blockquote>a</blockquote><blockquote>b</blockquote></div>";
        assert_eq!(block_quote(html, &ctx("div:blockquote:", &kwargs)), None);
    }

    #[test]
    fn test_embed_youtube() {
        let kwargs = Kwargs::new();
        let html = r#"<figure><iframe src="https://www.youtube.com/embed/XYZ?x=1"></iframe></figure>"#;
        assert_eq!(
            embed(html, &ctx("figure:iframe:", &kwargs)),
            Some(Block::Embed("https://youtu.be/XYZ".into()))
        );
    }

    #[test]
    fn test_embed_other_and_missing_src() {
        let kwargs = Kwargs::new();
        assert_eq!(
            embed(
                r#"<iframe src="https://player.vimeo.com/video/42"></iframe>"#,
                &ctx("iframe:", &kwargs)
            ),
            Some(Block::Embed("https://player.vimeo.com/video/42".into()))
        );
        assert_eq!(embed("<iframe></iframe>", &ctx("iframe:", &kwargs)), None);
    }

    #[test]
    fn test_embed_requires_exactly_one_iframe() {
        let kwargs = Kwargs::new();
        let two = concat!(
            r#"<figure><iframe src="https://www.youtube.com/embed/a"></iframe>"#,
            r#"<iframe src="https://www.youtube.com/embed/b"></iframe></figure>"#,
        );
        assert_eq!(embed(two, &ctx("figure:iframe:", &kwargs)), None);
        assert_eq!(embed("<figure><img src=\"a\"></figure>", &ctx("figure:img:", &kwargs)), None);
    }

    #[test]
    fn test_normalize_nocookie() {
        assert_eq!(
            normalize_embed_url("//www.youtube-nocookie.com/embed/abc_D-9?rel=0"),
            "https://youtu.be/abc_D-9"
        );
    }

    #[test]
    fn test_description_pairs() {
        let kwargs = Kwargs::new();
        let html = "<dl><dt>Term</dt><dd>Desc</dd><dt>Orphan</dt></dl>";
        assert_eq!(
            description(html, &ctx("dl:dt:", &kwargs)),
            Some(Block::Description(DescriptionValue {
                items: vec![DescriptionItem {
                    term: "Term".into(),
                    description: "Desc".into(),
                }],
            }))
        );
    }

    #[test]
    fn test_description_without_terms() {
        let kwargs = Kwargs::new();
        assert_eq!(description("<dl><dd>x</dd></dl>", &ctx("dl:dd:", &kwargs)), None);
        assert_eq!(description("<dl><dt>x</dt></dl>", &ctx("dl:dt:", &kwargs)), None);
    }

    #[test]
    fn test_address() {
        let kwargs = Kwargs::new();
        let html = "<address>1 Main St<br>Town</address>";
        assert_eq!(
            address(html, &ctx("address:br:", &kwargs)),
            Some(Block::Address(html.into()))
        );
    }

    #[test]
    fn test_address_requires_exactly_one() {
        let kwargs = Kwargs::new();
        assert_eq!(address("<p>1 Main St</p>", &ctx("p:", &kwargs)), None);
        assert_eq!(
            address(
                "<div><address>One</address><address>Two</address></div>",
                &ctx("div:address:", &kwargs)
            ),
            None
        );
    }

    #[test]
    fn test_image_with_caption() {
        let kwargs = Kwargs::new();
        let html = r#"<figure><img src="a.jpg" alt="A cat"><figcaption> The cat </figcaption></figure>"#;
        assert_eq!(
            image(html, &ctx("figure:img:", &kwargs)),
            Some(Block::Image(ImageValue {
                src: "a.jpg".into(),
                alt: "A cat".into(),
                caption: "The cat".into(),
            }))
        );
    }

    #[test]
    fn test_image_ambiguous() {
        let kwargs = Kwargs::new();
        assert_eq!(image("<img alt=\"x\">", &ctx("img:", &kwargs)), None);
        assert_eq!(
            image("<p><img src=\"a\"><img src=\"b\"></p>", &ctx("p:img:", &kwargs)),
            None
        );
    }

    #[test]
    fn test_verbatim_builders() {
        let kwargs = Kwargs::new();
        let c = ctx("table:tbody:", &kwargs);
        let html = "<table><tbody><tr><td>1</td></tr></tbody></table>";
        for builder in [figure, title, pre, table, form, raw_html] {
            assert_eq!(builder(html, &c), Some(Block::raw_html(html)));
        }
        assert_eq!(rich_text(html, &c), Some(Block::rich_text(html)));
        assert_eq!(null(html, &c), None);
    }
}
