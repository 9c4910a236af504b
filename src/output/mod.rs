//! Output module for writing crawl results
//!
//! This module handles:
//! - Choosing where results go (stdout JSON, one Markdown file, a directory)
//! - Writing the JSON report and the per-page Markdown files
//! - Recording crawl statistics and printing the summary

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::JsonOutput;
pub use markdown::{format_page, sanitize_filename, MarkdownOutput};
pub use stats::{write_summary, CrawlStats};
pub use traits::{CrawlOutput, OutputError, OutputHandler, OutputResult};

use std::io;
use std::path::Path;

/// Picks the output handler for an optional output path
///
/// * `None` - pretty JSON on stdout
/// * `Some(path)` - Markdown, as a single file or a directory depending on
///   the path and the number of pages (see [`MarkdownOutput`])
pub fn handler_for(path: Option<&Path>) -> Box<dyn OutputHandler> {
    match path {
        Some(path) => Box::new(MarkdownOutput::new(path)),
        None => Box::new(JsonOutput::new(io::stdout())),
    }
}

/// Writes a finished crawl to its destination
///
/// # Returns
///
/// * `Ok(usize)` - Number of pages written
/// * `Err(OutputError)` - The destination could not be written
pub fn write_output(path: Option<&Path>, output: &CrawlOutput) -> OutputResult<usize> {
    handler_for(path).write(output)
}
