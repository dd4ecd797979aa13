//! ShardCache: one group's local cache behind a lock

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::byteview::ByteView;
use crate::error::Result;
use crate::lru::EvictionCache;
use crate::peers::{PeerPicker, Request};
use crate::stats::CacheStats;

/// Thread-safe local cache for one group
///
/// A single mutex guards lookups (which reorder recency) and inserts
/// (which may evict), so they never interleave.
pub struct ShardCache {
    /// Group name sent along with peer requests
    group: String,

    /// Byte-budgeted LRU store
    cache: Mutex<EvictionCache<ByteView>>,

    /// Hit, miss, and peer counters
    stats: Arc<CacheStats>,
}

impl ShardCache {
    /// Create a shard for one cache group
    ///
    /// # Arguments
    /// * `group` - Group name, sent with every peer request
    /// * `max_bytes` - Budget for keys plus values (`0` = unbounded)
    pub fn new(group: impl Into<String>, max_bytes: usize) -> Self {
        let stats = Arc::new(CacheStats::new());
        let evictions = Arc::clone(&stats);

        Self {
            group: group.into(),
            cache: Mutex::new(EvictionCache::with_eviction_callback(
                max_bytes,
                move |_key, _value: ByteView| evictions.record_eviction(),
            )),
            stats,
        }
    }

    /// Look up a key in the local cache
    ///
    /// # Arguments
    /// * `key` - Key to look up; a hit becomes most recently used
    ///
    /// # Returns
    /// * `Option<ByteView>` - Cached value, or `None` on a miss
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let value = self.cache.lock().get(key).cloned();
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Insert a value, evicting older entries if the budget is exceeded
    ///
    /// # Arguments
    /// * `key` - Cache key
    /// * `value` - Value to store; replaces any previous value for `key`
    pub fn add(&self, key: impl Into<String>, value: ByteView) {
        self.cache.lock().add(key, value);
        self.stats.record_insert();
    }

    /// Look up a key locally, falling back to its remote owner
    ///
    /// Returns `Ok(None)` when the key is missing and owned by this process;
    /// loading it is the caller's job. Values fetched from a peer are cached
    /// locally. Peer errors are returned as-is, without retries.
    ///
    /// # Arguments
    /// * `key` - Key to look up
    /// * `picker` - Decides which peer owns `key`
    ///
    /// # Returns
    /// * `Result<Option<ByteView>>` - The value, `None` for a locally owned
    ///   miss, or the peer's error
    pub fn get_or_fetch(&self, key: &str, picker: &dyn PeerPicker) -> Result<Option<ByteView>> {
        if let Some(value) = self.get(key) {
            return Ok(Some(value));
        }

        let Some(peer) = picker.pick_peer(key) else {
            return Ok(None);
        };

        match peer.get(&Request::new(self.group.as_str(), key)) {
            Ok(response) => {
                self.stats.record_peer_hit();
                let value = ByteView::from(response.value);
                self.add(key, value.clone());
                Ok(Some(value))
            }
            Err(e) => {
                self.stats.record_peer_error();
                warn!(group = %self.group, key, error = %e, "peer fetch failed");
                Err(e)
            }
        }
    }

    /// Remove a key from the local cache
    ///
    /// # Returns
    /// * `bool` - Whether the key was cached
    pub fn remove(&self, key: &str) -> bool {
        self.cache.lock().remove(key)
    }

    /// Drop every cached entry and reset statistics
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.stats.reset();
    }

    /// Group this shard caches
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Bytes used by cached keys and values
    pub fn used_bytes(&self) -> usize {
        self.cache.lock().used_bytes()
    }

    /// Configured byte budget
    pub fn max_bytes(&self) -> usize {
        self.cache.lock().max_bytes()
    }
}

impl std::fmt::Debug for ShardCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardCache")
            .field("group", &self.group)
            .field("cache", &*self.cache.lock())
            .finish()
    }
}
