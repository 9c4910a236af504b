//! Configuration module for Page-Ripple
//!
//! This module holds the crawl parameters and loads optional TOML
//! configuration files. Command-line flags are applied on top of the loaded
//! values by the binary.
//!
//! # Example
//!
//! ```no_run
//! use page_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_user_agent, Config, CrawlConfig, FileConfig, OutputConfig, RendererConfig,
    RetryConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_crawl_config};
