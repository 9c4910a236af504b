//! JSON report written to stdout when no output path is given

use crate::crawler::PageResult;
use crate::output::traits::{CrawlOutput, OutputHandler, OutputResult};
use serde::Serialize;
use std::io::Write;

/// Shape of the JSON report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    total: usize,
    duration: String,
    pages: &'a [PageResult],
}

/// Writes the crawl as pretty-printed JSON
pub struct JsonOutput<W: Write> {
    writer: W,
}

impl<W: Write> JsonOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputHandler for JsonOutput<W> {
    fn write(&mut self, output: &CrawlOutput) -> OutputResult<usize> {
        let report = JsonReport {
            url: &output.url,
            total: output.pages.len(),
            duration: output.duration_string(),
            pages: &output.pages,
        };

        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;

        Ok(output.pages.len())
    }
}
