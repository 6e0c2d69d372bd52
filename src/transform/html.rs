//! HTML tag stripping
//!
//! Text nodes are collected in document order with whitespace collapsed.
//! Content of non-rendered elements (scripts, styles, the head) is dropped;
//! the `<title>` is returned separately.

use crate::transform::ExtractedText;
use scraper::{Html, Selector};

/// Elements whose text content is never part of the readable body
const NON_BODY_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Strips tags from an HTML document
///
/// # Example
///
/// ```
/// use document_ingestor::transform::strip_tags;
///
/// let extracted = strip_tags("<html><body><h1>Hello</h1><p>world</p></body></html>");
/// assert_eq!(extracted.text, "Hello\nworld");
/// ```
pub fn strip_tags(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);

    let mut chunks = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| NON_BODY_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            chunks.push(collapsed);
        }
    }

    ExtractedText {
        title: extract_title(&document),
        text: chunks.join("\n"),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
