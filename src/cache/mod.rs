//! Response cache module
//!
//! Caches the Markdown produced for a URL so repeated crawls can skip
//! rendering. A missing entry is only a missed optimization; the crawler
//! works the same with no cache at all.

mod memory;

use std::time::Duration;

pub use memory::{CachedEntry, MemoryCache};

/// How long converted pages stay cached
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Time-bounded key/value store shared by all crawl workers
pub trait ResponseCache: Send + Sync {
    /// Returns the value for `key` if present and not expired
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `ttl`
    fn set(&self, key: &str, value: String, ttl: Duration);
}
