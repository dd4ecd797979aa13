//! Shard counters
//!
//! Counters are relaxed atomics: they are read for reporting only, never to
//! make decisions, so no ordering with the cache lock is needed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one [`ShardCache`](crate::ShardCache)
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    peer_hits: AtomicU64,
    peer_errors: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lookups answered from the local cache
    pub hits: u64,
    /// Lookups that found nothing locally
    pub misses: u64,
    /// Values added to the local cache
    pub inserts: u64,
    /// Entries that left the cache (budget eviction or explicit removal)
    pub evictions: u64,
    /// Values served to this shard by a remote owner
    pub peer_hits: u64,
    /// Failed fetches from a remote owner
    pub peer_errors: u64,
}

impl StatsSnapshot {
    /// Local hit ratio in `[0.0, 1.0]`, `0.0` before any lookup
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CacheStats {
    /// Create a zeroed tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_hit(&self) {
        self.peer_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_error(&self) {
        self.peer_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            peer_hits: self.peer_hits.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.inserts,
            &self.evictions,
            &self.peer_hits,
            &self.peer_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
