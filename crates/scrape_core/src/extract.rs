use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{decode_body, Kind, ScrapeError};

/// Class value an `<h1>` must carry, exactly, to count as the product title.
pub const PRODUCT_TITLE_CLASS: &str = "product-title";

pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        body: &[u8],
        kind: Kind,
        content_type: Option<&str>,
    ) -> Result<String, ScrapeError>;
}

/// Dispatches on [`Kind`]:
/// - JSON: top-level string field `title`
/// - HTML: first `<h1 class="product-title">` in document order, or `""` when absent
/// - anything else: [`ScrapeError::UnsupportedKind`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleExtractor;

impl Extractor for TitleExtractor {
    fn extract(
        &self,
        body: &[u8],
        kind: Kind,
        content_type: Option<&str>,
    ) -> Result<String, ScrapeError> {
        match kind {
            Kind::Json => json_title(body),
            Kind::Html => {
                let decoded = decode_body(body, content_type)?;
                Ok(html_title(&decoded.text))
            }
            Kind::Unsupported => Err(ScrapeError::UnsupportedKind),
        }
    }
}

/// Decoded through a generic object so a repeated `title` key keeps its last
/// value; `null` is an object without fields.
#[derive(Debug, Deserialize)]
#[serde(from = "Option<Map<String, Value>>")]
struct TitleDocument {
    // Kept untyped so a non-string title is a missing field, not a decode error.
    title: Option<Value>,
}

impl From<Option<Map<String, Value>>> for TitleDocument {
    fn from(fields: Option<Map<String, Value>>) -> Self {
        Self {
            title: fields.and_then(|mut fields| fields.remove("title")),
        }
    }
}

pub fn json_title(body: &[u8]) -> Result<String, ScrapeError> {
    let document: TitleDocument =
        serde_json::from_slice(body).map_err(|err| ScrapeError::decode(err.to_string()))?;
    match document.title {
        Some(Value::String(title)) => Ok(title),
        _ => Err(ScrapeError::FieldNotFound),
    }
}

/// Pre-order, left-to-right search for the product title. A match whose first
/// child yields no text does not end the search.
pub fn html_title(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .tree
        .root()
        .descendants()
        .find_map(product_title)
        .unwrap_or_default()
}

fn product_title(node: NodeRef<'_, Node>) -> Option<String> {
    let element = node.value().as_element()?;
    if element.name() != "h1" || element.attr("class") != Some(PRODUCT_TITLE_CLASS) {
        return None;
    }
    node.first_child()
        .and_then(first_child_text)
        .filter(|text| !text.is_empty())
}

fn first_child_text(child: NodeRef<'_, Node>) -> Option<String> {
    match child.value() {
        Node::Text(text) => {
            let text: &str = text;
            Some(text.to_owned())
        }
        Node::Element(_) => ElementRef::wrap(child).map(|element| element.text().collect()),
        _ => None,
    }
}
