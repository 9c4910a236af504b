//! Markdown file output
//!
//! A crawl is written either as a single Markdown file (when the output path
//! ends in `.md` and there is exactly one page) or as a directory holding one
//! file per page, named after the page URL.

use crate::crawler::PageResult;
use crate::output::traits::{CrawlOutput, OutputHandler, OutputResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Longest path component kept in a file name
const MAX_PATH_LEN: usize = 100;

/// Longest file name, without the `.md` extension
const MAX_FILENAME_LEN: usize = 200;

/// Characters that are not allowed in file names on common platforms
const UNSAFE_CHARS: &[char] = &[':', '*', '?', '<', '>', '|', '"'];

/// Writes pages as Markdown files under a user-supplied path
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    path: PathBuf,
}

impl MarkdownOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns true if `path` names a Markdown file rather than a directory
    pub fn is_markdown_file(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false)
    }

    /// Directory used for multi-page output; a `.md` suffix is stripped
    pub fn directory_for(path: &Path) -> PathBuf {
        if Self::is_markdown_file(path) {
            path.with_extension("")
        } else {
            path.to_path_buf()
        }
    }

    fn write_single(&self, page: &PageResult) -> OutputResult<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, format_page(page))?;
        tracing::info!("Results saved to: {} (Markdown format)", self.path.display());
        Ok(1)
    }

    fn write_directory(&self, pages: &[PageResult]) -> OutputResult<usize> {
        let dir = Self::directory_for(&self.path);
        fs::create_dir_all(&dir)?;

        let mut used = HashSet::new();
        let mut saved = 0;

        for (index, page) in pages.iter().enumerate() {
            let base = sanitize_filename(&page.url, index);
            let stem = base.trim_end_matches(".md").to_string();
            let mut filename = base;
            let mut suffix = index + 1;
            while !used.insert(filename.clone()) {
                filename = format!("{}_{}.md", stem, suffix);
                suffix += 1;
            }

            let file_path = dir.join(&filename);
            match fs::write(&file_path, format_page(page)) {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::warn!("Failed to create file {}: {}", file_path.display(), e);
                }
            }
        }

        tracing::info!(
            "Results saved to directory: {} ({} files)",
            dir.display(),
            saved
        );
        Ok(saved)
    }
}

impl OutputHandler for MarkdownOutput {
    fn write(&mut self, output: &CrawlOutput) -> OutputResult<usize> {
        match output.pages.as_slice() {
            [page] if Self::is_markdown_file(&self.path) => self.write_single(page),
            pages => self.write_directory(pages),
        }
    }
}

/// Renders one page with its header block
///
/// ```text
/// # <url>
///
/// **Source URL:** <url>
/// **Depth:** <depth>
///
/// ---
///
/// <markdown>
/// ```
pub fn format_page(page: &PageResult) -> String {
    format!(
        "# {url}\n\n**Source URL:** {url}  \n**Depth:** {depth}  \n\n---\n\n{markdown}\n",
        url = page.url,
        depth = page.depth,
        markdown = page.markdown
    )
}

/// Builds a file name for a page from its URL
///
/// The host (dots replaced by `_`) and the path (slashes replaced by `_`,
/// `index` for the root) are joined with `_`. Characters that are unsafe in
/// file names become `_`. Falls back to `page_NNN.md` (1-based `index`) when
/// the URL cannot be parsed.
///
/// # Examples
///
/// ```
/// use page_ripple::output::sanitize_filename;
///
/// assert_eq!(sanitize_filename("https://example.com/", 0), "example_com_index.md");
/// assert_eq!(sanitize_filename("https://example.com/docs/intro", 0), "example_com_docs_intro.md");
/// assert_eq!(sanitize_filename("not a url", 4), "page_005.md");
/// ```
pub fn sanitize_filename(url: &str, index: usize) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return format!("page_{:03}.md", index + 1);
    };

    let mut parts = Vec::new();

    if let Some(host) = parsed.host_str() {
        if !host.is_empty() {
            parts.push(host.replace('.', "_"));
        }
    }

    let path = match parsed.path() {
        "" | "/" => "index".to_string(),
        path => path
            .trim_start_matches('/')
            .trim_end_matches('/')
            .replace(['/', '\\'], "_"),
    };
    let path = truncate_at_boundary(&path, MAX_PATH_LEN);
    if !path.is_empty() {
        parts.push(path.to_string());
    }

    let mut filename = parts.join("_");
    if filename.is_empty() {
        filename = format!("page_{:03}", index + 1);
    }

    let filename = filename.replace(UNSAFE_CHARS, "_");
    format!("{}.md", truncate_at_boundary(&filename, MAX_FILENAME_LEN))
}

/// Cuts `s` to at most `max` bytes without splitting a character
fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
