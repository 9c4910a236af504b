//! Link extraction for frontier expansion
//!
//! # Rules
//!
//! - Every `<a href="...">` with a non-empty href is considered
//! - The href is resolved against the page URL and normalized
//! - Anything that is not http(s) after resolution (`javascript:`,
//!   `mailto:`, `tel:`, `data:`, ...) is dropped
//! - Domain filter: see [`crate::url::is_allowed_domain`]
//! - Each target is returned once per page, in first-seen order

use crate::url::{is_allowed_domain, normalize_to_url, parse_absolute};
use crate::UrlError;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracts the in-scope links of a page
///
/// # Arguments
///
/// * `html` - Raw page HTML
/// * `base_url` - URL of the page, used to resolve relative hrefs
/// * `allowed_domains` - Allow-list; empty means "same host as `base_url`"
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Normalized, deduplicated links
/// * `Err(UrlError)` - `base_url` itself could not be parsed
///
/// # Example
///
/// ```
/// use page_ripple::crawler::extract_links;
///
/// let html = r#"<a href="/a">A</a><a href="/a#top">A again</a><a href="https://other.com/">X</a>"#;
/// let links = extract_links(html, "https://example.com/", &[]).unwrap();
/// assert_eq!(links, vec!["https://example.com/a"]);
/// ```
pub fn extract_links(
    html: &str,
    base_url: &str,
    allowed_domains: &[String],
) -> Result<Vec<String>, UrlError> {
    let base = parse_absolute(base_url)?;
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Ok(links);
    };

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.trim().is_empty() {
            continue;
        }

        let Ok(absolute) = base.join(href) else {
            continue;
        };

        // Rejects non-http(s) schemes as well as unparseable results
        let Ok(link) = normalize_to_url(absolute.as_str()) else {
            continue;
        };

        if !is_allowed_domain(&link, &base, allowed_domains) {
            continue;
        }

        let link = String::from(link);
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    tracing::debug!("Extracted {} link(s) from {}", links.len(), base_url);

    Ok(links)
}
