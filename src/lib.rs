//! Page-Ripple: a rendered-site crawler
//!
//! This crate walks a website breadth-first from a seed URL, renders each page
//! (headless browser or plain HTTP), picks out the main article content and
//! converts it to Markdown, within depth, page-count, domain and rate limits.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid start URL '{url}': {source}")]
    InvalidStartUrl { url: String, source: UrlError },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("No Chrome/Chromium executable found; set --browser or use --no-browser")]
    BrowserNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL must have a scheme (http or https): {0}")]
    MissingScheme(String),

    #[error("URL scheme must be http or https, got: {0}")]
    InvalidScheme(String),
}

/// A wait or sleep was interrupted by crawl cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Result type alias for Page-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{Coordinator, PageResult};
pub use state::{CrawlPhase, PageOutcome};
pub use url::{extract_domain, normalize_url};
