//! Main-content extraction
//!
//! Picks the element most likely to hold a page's article body and returns
//! a cleaned copy of its inner HTML.
//!
//! # Algorithm
//!
//! 1. Boilerplate (scripts, styles, navigation, headers, footers, asides,
//!    embeds and elements carrying ad/sidebar/menu/social/comment class or
//!    id markers) is ignored everywhere below.
//! 2. Candidate choice: the first `<article>`, else the first `<main>`,
//!    else the best scoring content container (`.content`, `.post`, ...),
//!    else the best scoring direct child of `<body>`.
//! 3. Scoring: see [`ContentExtractor::score_element`].
//! 4. Cleanup: empty paragraphs and containers are dropped and every
//!    attribute is stripped except `src`/`alt` on images and `href` on links.
//!
//! The parsed document is never mutated; boilerplate skipping and cleanup
//! happen while walking and re-serializing the tree.

use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

/// Errors produced while extracting content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no content found in document")]
    NoContent,
}

/// Elements removed outright, together with their subtrees
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "embed", "object",
];

/// Class tokens and ids that mark boilerplate containers
const BOILERPLATE_MARKERS: &[&str] = &[
    "ad",
    "advertisement",
    "sidebar",
    "navigation",
    "menu",
    "social",
    "share",
    "comments",
    "comment",
];

/// Containers commonly used for article bodies
const CONTENT_CONTAINERS: &str = ".content, .post, .article, .entry, .post-content";

/// Class/id substrings that raise a candidate's score
const POSITIVE_KEYWORDS: &[&str] = &["content", "article", "post", "entry", "main", "body"];

/// Class/id substrings that lower a candidate's score
const NEGATIVE_KEYWORDS: &[&str] = &[
    "ad",
    "advertisement",
    "sidebar",
    "nav",
    "menu",
    "footer",
    "header",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Readability-style content extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    /// Candidates with less visible text than this score zero
    min_text_length: usize,

    /// Candidates with a higher share of link text score zero
    max_link_density: f64,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            max_link_density: 0.5,
        }
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the main content of a page as cleaned HTML
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Inner HTML of the chosen element (may be empty for an
    ///   empty page)
    /// * `Err(ExtractError::NoContent)` - The document has no body to choose from
    pub fn extract_main_content(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);

        let chosen = self
            .choose_candidate(&document)
            .ok_or(ExtractError::NoContent)?;

        tracing::trace!("Chose <{}> as main content", chosen.value().name());

        let mut out = String::new();
        write_children(chosen, &mut out);
        Ok(out)
    }

    /// Returns the visible body text of a page
    ///
    /// Scripts and styles are skipped, the result is trimmed and runs of three
    /// or more newlines are collapsed to exactly two.
    pub fn extract_text(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);
        let body_selector = Selector::parse("body").map_err(|_| ExtractError::NoContent)?;
        let body = document
            .select(&body_selector)
            .next()
            .ok_or(ExtractError::NoContent)?;

        let mut text = String::new();
        collect_text(body, &mut text);

        Ok(collapse_newlines(text.trim()))
    }

    /// Scores one candidate element
    ///
    /// * Visible text shorter than 100 bytes (after trimming) scores 0.
    /// * Link density (anchor text / visible text) above 0.5 scores 0.
    /// * Otherwise: text length, +10 per paragraph, +5 per list, +2 per
    ///   image, +50 for each of {content, article, post, entry, main, body}
    ///   found in the class or id, -100 for each of {ad, advertisement,
    ///   sidebar, nav, menu, footer, header}.
    ///
    /// Boilerplate inside the element does not count towards any of these.
    pub fn score_element(&self, element: ElementRef<'_>) -> f64 {
        let stats = ContentStats::gather(element);

        let text_length = stats.text.trim().len();
        if text_length < self.min_text_length {
            return 0.0;
        }

        let link_density = stats.link_text.trim().len() as f64 / text_length as f64;
        if link_density > self.max_link_density {
            return 0.0;
        }

        let mut score = text_length as f64;
        score += stats.paragraphs as f64 * 10.0;
        score += stats.lists as f64 * 5.0;
        score += stats.images as f64 * 2.0;

        let class = element.value().attr("class").unwrap_or("").to_lowercase();
        let id = element.value().attr("id").unwrap_or("").to_lowercase();
        let mentions = |keyword: &&&str| class.contains(*keyword) || id.contains(*keyword);

        score += POSITIVE_KEYWORDS.iter().filter(mentions).count() as f64 * 50.0;
        score -= NEGATIVE_KEYWORDS.iter().filter(mentions).count() as f64 * 100.0;

        tracing::trace!(
            "Scored <{}> class={:?} id={:?}: {} (text={}, density={:.2})",
            element.value().name(),
            class,
            id,
            score,
            text_length,
            link_density
        );

        score
    }

    fn choose_candidate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        for tag in ["article", "main"] {
            if let Some(found) = first_visible(document, tag) {
                return Some(found);
            }
        }

        if let Ok(selector) = Selector::parse(CONTENT_CONTAINERS) {
            let containers: Vec<ElementRef<'a>> = document
                .select(&selector)
                .filter(|element| !is_removed(*element))
                .collect();
            if let Some(best) = self.select_best(&containers) {
                return Some(best);
            }
        }

        let body = first_visible(document, "body")?;
        let children: Vec<ElementRef<'a>> = body
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| !is_boilerplate(child.value()))
            .collect();

        Some(self.select_best(&children).unwrap_or(body))
    }

    /// Highest score wins, ties keep the earlier candidate, and the first
    /// candidate is the fallback when nothing scores above zero
    fn select_best<'a>(&self, candidates: &[ElementRef<'a>]) -> Option<ElementRef<'a>> {
        let mut best: Option<(ElementRef<'a>, f64)> = None;

        for candidate in candidates {
            let score = self.score_element(*candidate);
            let best_score = best.map(|(_, s)| s).unwrap_or(0.0);
            if score > best_score {
                best = Some((*candidate, score));
            }
        }

        best.map(|(element, _)| element)
            .or_else(|| candidates.first().copied())
    }
}

/// Counters gathered over the visible part of a subtree
#[derive(Debug, Default)]
struct ContentStats {
    text: String,
    link_text: String,
    paragraphs: usize,
    lists: usize,
    images: usize,
}

impl ContentStats {
    fn gather(element: ElementRef<'_>) -> Self {
        let mut stats = Self::default();
        stats.walk(element, 0);
        stats
    }

    fn walk(&mut self, node: ElementRef<'_>, anchor_depth: usize) {
        for child in node.children() {
            match child.value() {
                Node::Text(text) => {
                    self.text.push_str(text);
                    if anchor_depth > 0 {
                        self.link_text.push_str(text);
                    }
                }
                Node::Element(element) => {
                    if is_boilerplate(element) {
                        continue;
                    }
                    match element.name() {
                        "p" => self.paragraphs += 1,
                        "ul" | "ol" => self.lists += 1,
                        "img" => self.images += 1,
                        _ => {}
                    }

                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if element.name() == "a" {
                        self.walk(child, anchor_depth + 1);
                        if anchor_depth == 0 {
                            self.link_text.push(' ');
                        }
                    } else {
                        self.walk(child, anchor_depth);
                    }
                }
                _ => {}
            }
        }
    }
}

fn is_boilerplate(element: &Element) -> bool {
    if REMOVED_TAGS.contains(&element.name()) {
        return true;
    }

    let marked = |value: &str| {
        BOILERPLATE_MARKERS
            .iter()
            .any(|marker| value.eq_ignore_ascii_case(marker))
    };

    element.classes().any(marked) || element.id().map(marked).unwrap_or(false)
}

/// True if the element or one of its ancestors is boilerplate
fn is_removed(element: ElementRef<'_>) -> bool {
    is_boilerplate(element.value())
        || element
            .ancestors()
            .filter_map(|node| node.value().as_element())
            .any(is_boilerplate)
}

fn first_visible<'a>(document: &'a Html, tag: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(tag).ok()?;
    document.select(&selector).find(|element| !is_removed(*element))
}

/// Visible text of a subtree, skipping boilerplate
fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if !is_boilerplate(e) => {
                if let Some(child) = ElementRef::wrap(child) {
                    text.push_str(&visible_text(child));
                }
            }
            _ => {}
        }
    }
    text
}

/// True if the visible subtree holds an element matching `pred`
fn contains_visible(element: ElementRef<'_>, pred: fn(&str) -> bool) -> bool {
    element.descendants().skip(1).any(|node| {
        let Some(inner) = ElementRef::wrap(node) else {
            return false;
        };
        pred(inner.value().name()) && !is_removed(inner)
    })
}

/// Decides whether cleanup drops an element
///
/// Paragraphs and divs go when their text is blank unless they hold an
/// image; other non-void elements go when they have neither text nor any
/// void element (image, line break, ...) inside.
fn is_empty_element(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if VOID_ELEMENTS.contains(&name) {
        return false;
    }

    if !visible_text(element).trim().is_empty() {
        return false;
    }

    match name {
        "p" | "div" => !contains_visible(element, |n| n == "img"),
        _ => !contains_visible(element, |n| VOID_ELEMENTS.contains(&n)),
    }
}

fn write_children(node: ElementRef<'_>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(element) => {
                if is_boilerplate(element) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_empty_element(child) {
                    continue;
                }
                write_element(child, out);
            }
            // Comments, doctypes and processing instructions are dropped
            _ => {}
        }
    }
}

fn write_element(node: ElementRef<'_>, out: &mut String) {
    let element = node.value();
    let name = element.name();
    out.push('<');
    out.push_str(name);

    let kept: &[&str] = match name {
        "img" => &["src", "alt"],
        "a" => &["href"],
        _ => &[],
    };
    for attr in kept {
        if let Some(value) = element.attr(attr) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(node, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Body text for [`ContentExtractor::extract_text`]: only scripts and
/// styles are skipped
fn collect_text(node: ElementRef<'_>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if !matches!(element.name(), "script" | "style") => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run <= 2 {
                out.push(c);
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new()
    }

    fn first<'a>(document: &'a Html, selector: &str) -> ElementRef<'a> {
        let selector = Selector::parse(selector).unwrap();
        document.select(&selector).next().unwrap()
    }

    fn filler(len: usize) -> String {
        "lorem ipsum dolor sit amet ".repeat(len / 27 + 1)[..len].to_string()
    }

    #[test]
    fn test_article_wins_and_boilerplate_removed() {
        let html = r#"
            <html><head><title>Test</title></head><body>
                <nav>Navigation</nav>
                <article>
                    <h1>Main Title</h1>
                    <p>This is the main content.</p>
                    <p>Another paragraph.</p>
                    <script>alert('x')</script>
                </article>
                <aside>Sidebar</aside>
            </body></html>
        "#;

        let result = extractor().extract_main_content(html).unwrap();
        assert!(result.contains("Main Title"));
        assert!(result.contains("main content"));
        assert!(!result.contains("Navigation"));
        assert!(!result.contains("Sidebar"));
        assert!(!result.contains("alert"));
        assert!(!result.contains("<article"), "output is inner HTML");
    }

    #[test]
    fn test_main_used_when_no_article() {
        let html = r#"<body><div>Outside</div><main><p>Inside main</p></main></body>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert_eq!(result, "<p>Inside main</p>");
    }

    #[test]
    fn test_article_inside_boilerplate_skipped() {
        let html = r#"<body>
            <aside><article><p>Related story</p></article></aside>
            <article><p>Real story</p></article>
        </body>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert!(result.contains("Real story"));
        assert!(!result.contains("Related story"));
    }

    #[test]
    fn test_content_container_scoring() {
        let html = format!(
            r#"<body>
                <div class="post">{short}</div>
                <div class="content"><p>{long}</p><p>{long}</p></div>
            </body>"#,
            short = "too short",
            long = filler(150)
        );
        let result = extractor().extract_main_content(&html).unwrap();
        assert!(result.starts_with("<p>lorem"));
        assert!(!result.contains("too short"));
    }

    #[test]
    fn test_body_children_scored() {
        let html = format!(
            r#"<body>
                <div id="links">{links}</div>
                <div id="story"><p>{text}</p></div>
            </body>"#,
            links = "<a href='/a'>one</a> <a href='/b'>two</a>",
            text = filler(300)
        );
        let result = extractor().extract_main_content(&html).unwrap();
        assert!(result.contains("lorem ipsum"));
        assert!(!result.contains("one"));
    }

    #[test]
    fn test_fallback_to_first_candidate_when_all_zero() {
        let html = r#"<body><div>first</div><div>second</div></body>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert_eq!(result, "first");
    }

    #[test]
    fn test_ties_keep_first() {
        let text = filler(200);
        let html = format!(
            r#"<body><section><p>{text}</p></section><section><p>{text}</p><!-- second --></section></body>"#
        );
        let document = Html::parse_document(&html);
        let selector = Selector::parse("section").unwrap();
        let sections: Vec<_> = document.select(&selector).collect();

        let ex = extractor();
        assert_eq!(ex.score_element(sections[0]), ex.score_element(sections[1]));
        let best = ex.select_best(&sections).unwrap();
        assert_eq!(best.id(), sections[0].id());
    }

    #[test]
    fn test_short_text_scores_zero() {
        let document = Html::parse_document("<div><p>just a few words</p></div>");
        assert_eq!(extractor().score_element(first(&document, "div")), 0.0);
    }

    #[test]
    fn test_link_density_above_half_scores_zero() {
        // 200 bytes of text, 120 of them inside links
        let html = format!(
            "<div>{plain}<a href='/x'>{link}</a></div>",
            plain = "p".repeat(80),
            link = "l".repeat(120)
        );
        let document = Html::parse_document(&html);
        assert_eq!(extractor().score_element(first(&document, "div")), 0.0);
    }

    #[test]
    fn test_score_formula() {
        // 200 bytes of text in two paragraphs, one list, one image
        let html = format!(
            "<div><p>{a}</p><p>{b}</p><ul><li>{c}</li></ul><img src='x.png'></div>",
            a = "a".repeat(100),
            b = "b".repeat(90),
            c = "c".repeat(10)
        );
        let document = Html::parse_document(&html);
        let score = extractor().score_element(first(&document, "div"));
        assert_eq!(score, 200.0 + 20.0 + 5.0 + 2.0);
    }

    #[test]
    fn test_keyword_bonus_and_penalty() {
        let text = "x".repeat(200);
        let html = format!(
            r#"<div class="main-content">{text}</div><div class="sidebar-menu">{text}</div>"#
        );
        let document = Html::parse_document(&html);
        let selector = Selector::parse("div").unwrap();
        let divs: Vec<_> = document.select(&selector).collect();

        let ex = extractor();
        // "main" and "content"
        assert_eq!(ex.score_element(divs[0]), 200.0 + 100.0);
        // "sidebar" and "menu"
        assert_eq!(ex.score_element(divs[1]), 200.0 - 200.0);
    }

    #[test]
    fn test_boilerplate_text_not_scored() {
        let html = format!(
            "<div><nav>{nav}</nav><p>short</p></div>",
            nav = "n".repeat(500)
        );
        let document = Html::parse_document(&html);
        assert_eq!(extractor().score_element(first(&document, "div")), 0.0);
    }

    #[test]
    fn test_attributes_stripped() {
        let html = r#"<article>
            <p class="lead" style="color:red" onclick="evil()">Hello</p>
            <a href="/next" class="btn" onclick="evil()">Next</a>
            <img src="a.png" alt="A" width="10" onerror="evil()">
        </article>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert!(result.contains("<p>Hello</p>"));
        assert!(result.contains(r#"<a href="/next">Next</a>"#));
        assert!(result.contains(r#"<img src="a.png" alt="A">"#));
        assert!(!result.contains("evil"));
        assert!(!result.contains("class"));
    }

    #[test]
    fn test_empty_elements_removed() {
        let html = r#"<article>
            <p>   </p>
            <div>
            </div>
            <span></span>
            <div><img src="only.png"></div>
            <p>Kept</p>
        </article>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert!(!result.contains("<span>"));
        assert!(!result.contains("<p> "));
        assert!(result.contains(r#"<div><img src="only.png"></div>"#));
        assert!(result.contains("<p>Kept</p>"));
    }

    #[test]
    fn test_boilerplate_class_markers() {
        let html = r#"<article>
            <div class="share buttons">Share this</div>
            <div id="comments">Comment thread</div>
            <div class="adventure">Story text</div>
        </article>"#;
        let result = extractor().extract_main_content(html).unwrap();
        assert!(!result.contains("Share this"));
        assert!(!result.contains("Comment thread"));
        assert!(result.contains("Story text"), "markers match whole tokens only");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = "<article><p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p></article>";
        let result = extractor().extract_main_content(html).unwrap();
        assert_eq!(result, "<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>");
    }

    #[test]
    fn test_empty_document() {
        let result = extractor().extract_main_content("").unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_extract_text() {
        let html = r#"
            <html><body>
                <h1>Title</h1>
                <script>var hidden = 1;</script>
                <p>Paragraph 1</p>
                <style>p { color: red }</style>
                <p>Paragraph 2</p>
            </body></html>
        "#;
        let text = extractor().extract_text(html).unwrap();
        assert!(text.starts_with("Title"));
        assert!(text.contains("Paragraph 1"));
        assert!(text.ends_with("Paragraph 2"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_newlines("a\n\nb\nc"), "a\n\nb\nc");
    }
}
