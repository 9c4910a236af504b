//! Crawler module for page rendering and processing
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier with exactly-once dispatch
//! - Rate limiting and retry with exponential backoff
//! - Page rendering (headless browser or plain HTTP)
//! - Main-content extraction, Markdown conversion and link extraction
//! - Overall crawl coordination

mod converter;
mod coordinator;
mod extractor;
mod frontier;
mod links;
mod rate;
mod renderer;
mod retry;

pub use converter::{ConvertError, Converter, MarkdownConverter};
pub use coordinator::{Coordinator, CrawlReport};
pub use extractor::{ContentExtractor, ExtractError};
pub use frontier::{Frontier, FrontierEntry};
pub use links::extract_links;
pub use rate::RateController;
pub use renderer::{
    build_http_client, build_renderer, discover_browser, ChromeRenderer, HttpRenderer,
    RenderError, RenderErrorKind, Renderer,
};
pub use retry::{is_retryable_message, retry, RetryError, Retryable};

use serde::{Deserialize, Serialize};

/// One crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Normalized page URL
    pub url: String,

    /// Main content as Markdown
    pub markdown: String,

    /// Link distance from the seed
    pub depth: u32,
}
