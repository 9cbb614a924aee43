// src/fetch/links.rs
// =============================================================================
// Link extraction from fetched pages.
//
// HTML pages go through `scraper` (html5ever + CSS selectors), markdown
// pages through `pulldown-cmark`. In both cases every href is resolved
// against the URL of the page it came from, so relative links like "/docs"
// or "../about" become absolute URLs that can be fetched directly.
//
// We skip:
// - in-page anchors ("#section")
// - mailto:, tel:, javascript: and data: links
// - anything that does not resolve to http/https
//
// Fragments are stripped from the result, so "/docs#intro" and "/docs"
// produce the same node id and are only crawled once.
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};
use scraper::{Html, Selector};
use url::Url;

// Extracts all crawlable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base: the URL of the page (for resolving relative links)
//
// Returns: absolute http(s) URLs in document order (duplicates kept)
pub fn extract_html_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").expect("a[href] is a valid selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .collect()
}

// Extracts all crawlable links from Markdown text
//
// pulldown-cmark emits Start(Link) / Text / End(Link) for every [text](url);
// the destination is on the Start event, so that's the only one we need.
pub fn extract_markdown_links(markdown: &str, base: &Url) -> Vec<Url> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => {
                resolve_link(base, &dest_url)
            }
            _ => None,
        })
        .collect()
}

/// Text of the first `<title>` element, trimmed, if the page has one.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").expect("title is a valid selector");

    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

// Resolves a link (possibly relative) to an absolute, fragment-free URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    // join() handles both cases: absolute hrefs replace the base entirely,
    // relative ones are resolved the way a browser would
    let mut url = base.join(href).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}
