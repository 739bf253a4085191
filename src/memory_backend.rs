use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::error::CacheResult;
use crate::keys::glob_match;

/// Default number of entries held by [`MemoryCacheBackend::new`].
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Entry metadata for expiry and eviction
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Utc::now(),
            ttl,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.inserted_at);
        elapsed.to_std().ok().is_some_and(|d| d >= self.ttl)
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_key: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first. May hold keys already removed from `by_key`.
    insertion_order: VecDeque<String>,
}

impl Entries {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.by_key.remove(key);
        if removed.is_some() {
            self.insertion_order.retain(|k| k != key);
        }
        removed
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.by_key.len();
        self.by_key.retain(|_, entry| !entry.is_expired(now));
        let by_key = &self.by_key;
        self.insertion_order.retain(|k| by_key.contains_key(k));
        before - self.by_key.len()
    }

    fn evict_oldest(&mut self) {
        while let Some(key) = self.insertion_order.pop_front() {
            if self.by_key.remove(&key).is_some() {
                debug!("Evicted cache entry '{}'", key);
                return;
            }
        }
    }
}

/// In-process cache backend with per-entry TTL and FIFO eviction.
///
/// Expired entries are dropped lazily on access and before eviction.
/// Patterns support `*`, `?` and backslash escapes.
#[derive(Debug)]
pub struct MemoryCacheBackend {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl MemoryCacheBackend {
    /// Creates an empty backend holding up to [`DEFAULT_CAPACITY`] entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty backend holding up to `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the maximum number of entries held before eviction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.read().by_key.len()
    }

    /// Returns true if the backend holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().by_key.is_empty()
    }

    /// Drops every expired entry and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.entries.write().purge_expired(Utc::now())
    }

    /// Removes all entries
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.by_key.clear();
        entries.insertion_order.clear();
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Utc::now();
        {
            let entries = self.entries.read();
            match entries.by_key.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it so it does not linger until eviction.
        let mut entries = self.entries.write();
        if entries.by_key.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.write();
        entries.remove(key);

        if entries.by_key.len() >= self.capacity {
            entries.purge_expired(Utc::now());
        }
        while entries.by_key.len() >= self.capacity && !entries.insertion_order.is_empty() {
            entries.evict_oldest();
        }

        entries.by_key.insert(key.to_string(), CacheEntry::new(value, ttl));
        entries.insertion_order.push_back(key.to_string());
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> CacheResult<HashSet<String>> {
        let now = Utc::now();
        let entries = self.entries.read();
        Ok(entries
            .by_key
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
