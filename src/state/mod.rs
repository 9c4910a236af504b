//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of one crawl (seeded, running, draining, done)
//! - `PageOutcome`: What happened to each dispatched URL

mod outcome;
mod phase;

// Re-export main types
pub use outcome::PageOutcome;
pub use phase::CrawlPhase;
