//! HTML parser for extracting links and metadata
//!
//! Runs over the markup captured from the browser after rendering settled,
//! so it sees every anchor that existed in the live DOM at capture time.

use scraper::{ElementRef, Html, Selector};

/// Extracted information from a rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw `href` values of all anchors, in document order
    pub links: Vec<String>,
}

/// Parses rendered HTML and extracts the title and outbound link targets
///
/// Links are returned exactly as written in the `href` attribute; resolving
/// them against the page URL and dropping non-web schemes is the
/// canonicalizer's job. Only anchors with an `href` that is present and not
/// blank are returned.
///
/// # Example
///
/// ```
/// use docs_mirror::crawler::parse_html;
///
/// let html = r#"<html><head><title>Part 1</title></head><body><a href="./part2">Next</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title.as_deref(), Some("Part 1"));
/// assert_eq!(parsed.links, vec!["./part2".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
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

/// Extracts the raw `href` of every anchor element
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document.select(&a_selector).filter_map(anchor_href).collect()
}

/// The anchor's `href`, if the attribute is present and not blank
fn anchor_href(element: ElementRef<'_>) -> Option<String> {
    match element.value().attr("href") {
        Some(href) if !href.trim().is_empty() => Some(href.to_string()),
        _ => None,
    }
}
