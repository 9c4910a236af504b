//! Per-crawl statistics
//!
//! Workers record one [`PageOutcome`] per dispatched URL; the totals are
//! handed back alongside the results and printed in the stderr summary.

use crate::crawler::PageResult;
use crate::state::PageOutcome;
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// URLs handed to a worker
    pub visited: usize,

    /// Count of dispatched URLs by outcome
    pub outcomes: HashMap<PageOutcome, u64>,

    /// Wall-clock time of the crawl
    pub elapsed: Duration,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one dispatched URL
    pub fn record(&mut self, outcome: PageOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    /// Number of URLs that ended with `outcome`
    pub fn count(&self, outcome: PageOutcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Pages that produced a result
    pub fn succeeded(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| outcome.is_success())
            .map(|(_, count)| count)
            .sum()
    }

    /// Pages dropped because of a render, extraction or conversion error
    pub fn failed(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| outcome.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    /// Share of recorded pages that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let total: u64 = self.outcomes.values().sum();
        if total == 0 {
            0.0
        } else {
            (self.succeeded() as f64 / total as f64) * 100.0
        }
    }
}

/// Writes the human-readable crawl summary
///
/// `main` sends this to stderr so stdout stays reserved for the JSON report.
pub fn write_summary<W: Write>(
    out: &mut W,
    results: &[PageResult],
    stats: &CrawlStats,
) -> io::Result<()> {
    let separator = "-".repeat(80);

    writeln!(out)?;
    writeln!(out, "Crawl Summary:")?;
    writeln!(out, "{}", separator)?;
    writeln!(out, "Total pages: {}", results.len())?;
    writeln!(out, "Duration: {:?}", stats.elapsed)?;
    writeln!(
        out,
        "Visited: {} ({:.1}% succeeded)",
        stats.visited,
        stats.success_rate()
    )?;

    let mut counts: Vec<_> = stats
        .outcomes
        .iter()
        .filter(|(outcome, _)| !outcome.is_success())
        .collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (outcome, count) in counts {
        writeln!(out, "  {}: {}", outcome, count)?;
    }

    for (i, page) in results.iter().enumerate() {
        writeln!(out, "[{}] {} (depth: {})", i + 1, page.url, page.depth)?;
    }
    writeln!(out, "{}", separator)?;

    Ok(())
}
