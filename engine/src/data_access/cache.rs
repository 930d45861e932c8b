//! A generic, process-wide TTL cache.
//!
//! Grounded in the Nova services' shared caching layer (`nova-cache`), cut
//! down to the single in-process pattern this engine needs: no Redis, no
//! negative-cache sentinel, no SCAN-based invalidation — just a read-mostly
//! `HashMap` behind a lock, with last-writer-wins semantics, matching §5's
//! "no locking discipline beyond atomic dictionary-like updates" note.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// An in-process cache mapping `K -> V` with a single fixed TTL.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<K, Entry<V>>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached value for `key` if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|e| {
            if e.inserted_at.elapsed() < self.ttl {
                Some(e.value.clone())
            } else {
                None
            }
        })
    }

    /// Inserts or overwrites `key`. Last writer wins.
    pub async fn set(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Returns the cached value, or computes and caches it via `fetch` on a miss.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = V>,
    {
        if let Some(v) = self.get(&key).await {
            return v;
        }
        let value = fetch().await;
        self.set(key, value.clone()).await;
        value
    }

    /// Drops every entry, regardless of TTL.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Drops a single key.
    pub async fn invalidate_one(&self, key: &K) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}
