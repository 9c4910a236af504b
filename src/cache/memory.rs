//! In-memory response cache with per-entry expiry

use super::ResponseCache;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One cached value along with the time it was stored
///
/// `expires_at` is `None` when the requested TTL does not fit in a chrono
/// duration; such entries never expire.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// The cached value
    pub value: String,

    /// When the value was stored
    pub stored_at: DateTime<Utc>,

    /// When the value stops being served
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedEntry {
    /// Creates an entry stored now that expires after `ttl`
    pub fn new(value: String, ttl: std::time::Duration) -> Self {
        let stored_at = Utc::now();
        let expires_at = Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| stored_at.checked_add_signed(ttl));

        Self {
            value,
            stored_at,
            expires_at,
        }
    }

    /// Checks if the entry is past its expiry
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Returns how long ago the entry was stored
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }
}

/// Thread-safe expiring map
///
/// Stale entries are dropped lazily on lookup or in bulk by
/// [`MemoryCache::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes one entry, returning its value if it was present and fresh
    pub fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        entries
            .remove(key)
            .filter(|entry| !entry.is_stale())
            .map(|entry| entry.value)
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including stale ones not yet purged
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops all stale entries and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale_at(now));
        before - entries.len()
    }

    /// Purges stale entries every `interval` until `cancel` fires
    pub fn spawn_janitor(
        cache: Arc<Self>,
        interval: std::time::Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = cache.purge_expired();
                        if purged > 0 {
                            tracing::debug!("Purged {} expired cache entries", purged);
                        }
                    }
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedEntry>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, by: Duration) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.stored_at = entry.stored_at - by;
            entry.expires_at = entry.expires_at.map(|at| at - by);
        }
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_stale() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: std::time::Duration) {
        self.lock()
            .insert(key.to_string(), CachedEntry::new(value, ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    const DAY: StdDuration = StdDuration::from_secs(24 * 60 * 60);

    #[test]
    fn test_new_entry_not_stale() {
        let entry = CachedEntry::new("x".to_string(), DAY);
        assert!(!entry.is_stale());
    }

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = MemoryCache::new();
        cache.set("https://example.com/a", "# A".to_string(), DAY);
        assert_eq!(cache.get("https://example.com/a"), Some("# A".to_string()));
        assert_eq!(cache.get("https://example.com/b"), None);
    }

    #[test]
    fn test_entry_stale_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), DAY);

        // 25 hours ago
        cache.backdate("k", Duration::hours(25));

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "stale entry should be dropped on lookup");
    }

    #[test]
    fn test_entry_fresh_at_23_hours() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), DAY);
        cache.backdate("k", Duration::hours(23));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_zero_ttl_is_immediately_stale() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), StdDuration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = CachedEntry::new("v".to_string(), StdDuration::MAX);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_stale());
    }

    #[test]
    fn test_set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", "old".to_string(), DAY);
        cache.set("k", "new".to_string(), DAY);
        assert_eq!(cache.get("k"), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = MemoryCache::new();
        cache.set("a", "1".to_string(), DAY);
        cache.set("b", "2".to_string(), DAY);

        assert_eq!(cache.remove("a"), Some("1".to_string()));
        assert_eq!(cache.remove("a"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache.set("old", "1".to_string(), DAY);
        cache.set("new", "2".to_string(), DAY);
        cache.backdate("old", Duration::hours(48));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some("2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_purges_and_stops() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("gone", "1".to_string(), StdDuration::ZERO);
        cache.set("kept", "2".to_string(), DAY);

        let cancel = CancellationToken::new();
        let handle = MemoryCache::spawn_janitor(
            Arc::clone(&cache),
            StdDuration::from_secs(3600),
            cancel.clone(),
        );

        tokio::time::sleep(StdDuration::from_secs(3601)).await;
        assert_eq!(cache.len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_age() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), DAY);
        cache.backdate("k", Duration::hours(12));

        let age = cache.lock().get("k").map(|e| e.age()).unwrap();
        // Allow some tolerance for test execution time
        assert!(age.num_hours() >= 11 && age.num_hours() <= 13);
    }
}
