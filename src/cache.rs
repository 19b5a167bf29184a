use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::time::{Duration, Instant, interval};
use tracing::{debug, info};

use crate::metrics::CACHE_SIZE;

// Stored answer and the moment it was written
#[derive(Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

// Cache key for the text endpoint (hash of prompt + type + system instruction)
pub fn gemini_cache_key(prompt: &str, kind: &str, system_instruction: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt);
    hasher.update("_");
    hasher.update(kind);
    hasher.update("_");
    hasher.update(system_instruction);
    format!("{:x}", hasher.finalize())
}

// Cache key for the photo endpoint. The page size is not part of the key.
pub fn pexel_cache_key(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update("pexel_");
    hasher.update(query);
    format!("{:x}", hasher.finalize())
}

/// In-memory response cache with a fixed time-to-live.
///
/// Entries become invisible once `created_at + ttl` has passed. Expired
/// entries are dropped by the read that observes them and by
/// [`cache_sweeper`]; nothing else removes them.
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: None,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(self.ttl) {
                return Some(entry.value.clone());
            }
        }
        // the read guard must be gone before removing from the same shard
        self.entries.remove_if(key, |_, entry| entry.is_expired(self.ttl));
        CACHE_SIZE.set(self.entries.len() as f64);
        None
    }

    pub fn set(&self, key: String, value: Value) {
        if let Some(max) = self.max_entries {
            if self.entries.len() >= max && !self.entries.contains_key(&key) {
                self.make_room(max);
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Drop every expired entry, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        CACHE_SIZE.set(self.entries.len() as f64);
        removed
    }

    fn make_room(&self, max: usize) {
        if self.purge_expired() > 0 && self.entries.len() < max {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!(key = %key, "Cache full, evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}

// Background sweep of expired entries
pub async fn cache_sweeper(cache: Arc<TtlCache>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    info!(interval = ?sweep_interval, "Cache sweeper started");

    loop {
        interval.tick().await;

        let removed = cache.purge_expired();
        if removed > 0 {
            debug!(removed, remaining = cache.len(), "Swept expired cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gemini_key_is_stable_hex() {
        let a = gemini_cache_key("pitch me", "default", "be brief");
        let b = gemini_cache_key("pitch me", "default", "be brief");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn gemini_key_changes_with_every_parameter() {
        let base = gemini_cache_key("pitch me", "default", "be brief");
        assert_ne!(base, gemini_cache_key("Pitch me", "default", "be brief"));
        assert_ne!(base, gemini_cache_key("pitch me", "pitch", "be brief"));
        assert_ne!(base, gemini_cache_key("pitch me", "default", "be brief "));
    }

    #[test]
    fn gemini_key_matches_joined_digest() {
        let expected = format!("{:x}", Sha256::digest("a_b_c".as_bytes()));
        assert_eq!(gemini_cache_key("a", "b", "c"), expected);
    }

    #[test]
    fn pexel_key_depends_on_query_only() {
        assert_eq!(pexel_cache_key("cat"), pexel_cache_key("cat"));
        assert_ne!(pexel_cache_key("cat"), pexel_cache_key("cats"));
        assert_ne!(pexel_cache_key("cat"), gemini_cache_key("cat", "", ""));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k".to_string(), json!("v"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k"), Some(json!("v")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_creation_time() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("k".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k".to_string(), json!(2));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("old".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set("new".to_string(), json!(2));
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn full_cache_evicts_oldest() {
        let cache = TtlCache::new(Duration::from_secs(60)).with_max_entries(2);
        cache.set("a".to_string(), json!("a"));
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.set("b".to_string(), json!("b"));
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.set("c".to_string(), json!("c"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(json!("b")));
        assert_eq!(cache.get("c"), Some(json!("c")));
    }

    #[tokio::test(start_paused = true)]
    async fn overwriting_a_key_in_full_cache_keeps_others() {
        let cache = TtlCache::new(Duration::from_secs(60)).with_max_entries(2);
        cache.set("a".to_string(), json!(1));
        cache.set("b".to_string(), json!(2));
        cache.set("a".to_string(), json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(json!(3)));
        assert_eq!(cache.get("b"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_in_background() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(5)));
        cache.set("k".to_string(), json!("v"));

        tokio::spawn(cache_sweeper(cache.clone(), Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert!(cache.is_empty());
    }
}
