//! HTML fragment to Markdown conversion

use thiserror::Error;

/// Conversion failure; the page is skipped and never retried
#[derive(Debug, Error)]
#[error("failed to convert HTML to Markdown: {0}")]
pub struct ConvertError(String);

/// Deterministic HTML to Markdown transform
pub trait Converter: Send + Sync {
    fn html_to_markdown(&self, html: &str) -> Result<String, ConvertError>;
}

/// [`Converter`] backed by `htmd`
///
/// Output is trimmed and runs of more than two blank lines are collapsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for MarkdownConverter {
    fn html_to_markdown(&self, html: &str) -> Result<String, ConvertError> {
        let markdown = htmd::convert(html).map_err(|e| ConvertError(e.to_string()))?;
        Ok(tidy(&markdown))
    }
}

fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut newlines = 0;
    for c in markdown.trim().chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 3 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}
