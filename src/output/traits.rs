//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! data handed to them once a crawl has finished.

use crate::crawler::PageResult;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A finished crawl, ready to be written
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    /// Start URL as given by the user
    pub url: String,

    /// Page results in completion order
    pub pages: Vec<PageResult>,

    /// Wall-clock time of the crawl
    pub duration: Duration,
}

impl CrawlOutput {
    pub fn new(url: impl Into<String>, pages: Vec<PageResult>, duration: Duration) -> Self {
        Self {
            url: url.into(),
            pages,
            duration,
        }
    }

    /// Duration rendered for humans, e.g. `1.5s`
    pub fn duration_string(&self) -> String {
        format!("{:?}", self.duration)
    }
}

/// Trait for output handlers
///
/// Implementations write a finished crawl somewhere: stdout, one file or a
/// directory of files.
pub trait OutputHandler {
    /// Writes the crawl output
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of pages written
    /// * `Err(OutputError)` - Writing failed
    fn write(&mut self, output: &CrawlOutput) -> OutputResult<usize>;
}
