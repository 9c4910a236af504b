//! Crawl frontier: FIFO of pending URLs plus the visited set
//!
//! URLs are stored in their normalized form, which is the identity key for
//! deduplication. A URL enters the pending queue at most once and is handed
//! to a worker at most once:
//!
//! - `add` refuses URLs that are already pending or already visited
//! - the dispatcher calls `mark_visited` *before* handing a URL to a worker,
//!   so a concurrent rediscovery by another worker is refused by `add`

use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: String,

    /// Link distance from the seed, fixed at first discovery
    pub depth: u32,
}

#[derive(Debug, Default)]
struct FrontierState {
    /// Pending entries in discovery order
    pending: VecDeque<FrontierEntry>,

    /// URLs currently in `pending`
    queued: HashSet<String>,

    /// URLs already dispatched to a worker
    visited: HashSet<String>,
}

/// Thread-safe breadth-first frontier
///
/// All operations take `&self` and hold the internal lock only for the
/// duration of the call, never across an await point.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL at the given depth
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and has been appended to the queue
    /// * `false` - The URL could not be normalized, is already pending, or
    ///   has already been visited
    pub fn add(&self, url: &str, depth: u32) -> bool {
        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::trace!("Refusing un-normalizable URL {}: {}", url, e);
                return false;
            }
        };

        let mut state = self.lock();
        if state.visited.contains(&normalized) || state.queued.contains(&normalized) {
            return false;
        }

        state.queued.insert(normalized.clone());
        state.pending.push_back(FrontierEntry {
            url: normalized,
            depth,
        });
        true
    }

    /// Removes and returns the oldest pending entry
    pub fn pop(&self) -> Option<FrontierEntry> {
        let mut state = self.lock();
        let entry = state.pending.pop_front()?;
        state.queued.remove(&entry.url);
        Some(entry)
    }

    /// Records that a URL has been dispatched; idempotent
    pub fn mark_visited(&self, url: &str) {
        if let Ok(normalized) = normalize_url(url) {
            self.lock().visited.insert(normalized);
        }
    }

    /// Returns true if the URL has been dispatched
    pub fn is_visited(&self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.lock().visited.contains(&normalized),
            Err(_) => false,
        }
    }

    /// Number of pending entries
    pub fn size(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of dispatched URLs
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Every critical section leaves the sets consistent before it can panic
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
