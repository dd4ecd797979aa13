//! # ringcache
//!
//! Sharding and eviction primitives for a peer-to-peer, in-process cache.
//! Each process keeps a bounded local cache; every key is owned by exactly
//! one peer, chosen by consistent hashing.
//!
//! ## Architecture
//! - **ByteView**: immutable payload, copied on every read
//! - **EvictionCache**: byte-budgeted LRU, arena-backed list for O(1) eviction
//! - **HashRing**: consistent hashing with virtual nodes (CRC-32 by default)
//! - **PeerPicker / PeerGetter**: transport-agnostic peer routing
//! - **ShardCache**: a locked `EvictionCache` plus statistics
//!
//! ## Example
//! ```
//! use ringcache::{ByteView, LocalPicker, ShardCache};
//!
//! let shard = ShardCache::new("scores", 1 << 20);
//! shard.add("tom", ByteView::from("630"));
//!
//! let value = shard.get_or_fetch("tom", &LocalPicker).unwrap();
//! assert_eq!(value.unwrap().text(), "630");
//! ```

#![warn(missing_docs)]

mod byteview;
mod error;
mod lru;
mod peers;
mod ring;
mod shard;
mod stats;

pub use byteview::ByteView;
pub use error::{Error, Result};
pub use lru::{ByteSize, EvictionCache, EvictionCallback, Iter};
pub use peers::{LocalGetter, LocalPicker, PeerGetter, PeerPicker, Request, Response, RingPicker};
pub use ring::{HashFn, HashRing};
pub use shard::ShardCache;
pub use stats::{CacheStats, StatsSnapshot};
