//! Write-through TTL cache over the key-value store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::storage::{KeyValueStore, load_json, save_json};

/// Hit/miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Entries keyed by a normalized string. With no TTL an entry stays valid
/// until it is overwritten. Every insert is persisted before it returns.
pub struct TtlCache<V> {
    entries: BTreeMap<String, CacheEntry<V>>,
    ttl: Option<TimeDelta>,
    store: Arc<dyn KeyValueStore>,
    store_key: &'static str,
    stats: CacheStats,
}

impl<V> TtlCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Load persisted entries. A malformed record starts the cache empty.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        store_key: &'static str,
        ttl: Option<Duration>,
    ) -> Result<Self> {
        let entries: BTreeMap<String, CacheEntry<V>> =
            load_json(store.as_ref(), store_key)?.unwrap_or_default();
        debug!(store_key, entries = entries.len(), "cache loaded");
        Ok(Self {
            entries,
            ttl: ttl.map(|ttl| TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)),
            store,
            store_key,
            stats: CacheStats::default(),
        })
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Lookup as of `now`. An expired entry counts as a miss and is dropped
    /// from memory; it disappears from the store on the next write.
    pub fn get_at(&mut self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let key = cache_key(key);
        let Some(entry) = self.entries.get(&key) else {
            self.stats.misses += 1;
            return None;
        };
        if self.is_expired(entry, now) {
            trace!(store_key = self.store_key, key, "cache entry expired");
            self.entries.remove(&key);
            self.stats.expired += 1;
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        Some(entry.value.clone())
    }

    pub fn insert(&mut self, key: &str, value: V) -> Result<()> {
        self.insert_at(key, value, Utc::now())
    }

    pub fn insert_at(&mut self, key: &str, value: V, now: DateTime<Utc>) -> Result<()> {
        self.entries.insert(
            cache_key(key),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
        self.persist()
    }

    /// Drop every entry expired as of `now` and persist if anything went.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.stored_at) <= ttl);
        let purged = before - self.entries.len();
        if purged > 0 {
            self.persist()?;
        }
        Ok(purged)
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        self.ttl
            .is_some_and(|ttl| now.signed_duration_since(entry.stored_at) > ttl)
    }

    fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), self.store_key, &self.entries)
    }
}

fn cache_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
