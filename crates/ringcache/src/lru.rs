//! Byte-budgeted LRU (Least Recently Used) cache
//!
//! Entries live in a slot arena threaded by an index-based doubly-linked
//! list, so promotion and eviction are both O(1). The cache does no locking
//! of its own; see [`ShardCache`](crate::ShardCache) for the synchronized
//! wrapper.

use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use bytes::Bytes;
use tracing::debug;

/// Values stored in an [`EvictionCache`] report their size in bytes
pub trait ByteSize {
    /// Number of bytes this value accounts for in the cache budget
    fn byte_len(&self) -> usize;
}

impl ByteSize for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for &str {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Bytes {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Callback fired with every entry that leaves the cache
pub type EvictionCallback<V> = Box<dyn FnMut(String, V) + Send>;

/// Node in the LRU doubly-linked list
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V: ByteSize> Node<V> {
    fn size(&self) -> usize {
        self.key.len() + self.value.byte_len()
    }
}

/// LRU cache bounded by the total byte size of its keys and values
///
/// `head` is the most recently used entry, `tail` the next eviction victim.
pub struct EvictionCache<V> {
    map: HashMap<String, usize, RandomState>,
    nodes: Vec<Option<Node<V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    max_bytes: usize,
    used_bytes: usize,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: ByteSize> EvictionCache<V> {
    /// Create a cache holding at most `max_bytes` of keys plus values
    ///
    /// A budget of `0` means unbounded: nothing is ever evicted.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
            max_bytes,
            used_bytes: 0,
            on_evicted: None,
        }
    }

    /// Create a cache that reports every removed entry to `on_evicted`
    ///
    /// The callback runs once per entry, after the entry has been unlinked
    /// and the byte usage adjusted.
    pub fn with_eviction_callback<F>(max_bytes: usize, on_evicted: F) -> Self
    where
        F: FnMut(String, V) + Send + 'static,
    {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(Box::new(on_evicted));
        cache
    }

    /// Get a value and mark it as most recently used
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check for a key without touching its recency
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or replace a value, then evict until the budget is met
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.nodes[idx].as_mut() {
                self.used_bytes = self.used_bytes - node.value.byte_len() + value.byte_len();
                node.value = value;
            }
            self.promote(idx);
        } else {
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used_bytes += node.size();
            let idx = self.store(node);
            self.link_front(idx);
            self.map.insert(key, idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if !self.remove_oldest() {
                break;
            }
        }
    }

    /// Evict the least recently used entry
    ///
    /// Returns `false` if the cache was empty.
    pub fn remove_oldest(&mut self) -> bool {
        let Some(tail_idx) = self.tail else {
            return false;
        };

        match self.detach(tail_idx) {
            Some(node) => {
                debug!(
                    key = %node.key,
                    bytes = node.size(),
                    used_bytes = self.used_bytes,
                    "evicted cache entry"
                );
                self.notify(node);
                true
            }
            None => false,
        }
    }

    /// Remove a key, firing the eviction callback if it was present
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(&idx) = self.map.get(key) else {
            return false;
        };

        match self.detach(idx) {
            Some(node) => {
                self.notify(node);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, oldest first
    pub fn clear(&mut self) {
        while self.remove_oldest() {}

        self.nodes.clear();
        self.free_list.clear();
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bytes currently accounted to keys and values
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Configured byte budget (`0` = unbounded)
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn notify(&mut self, node: Node<V>) {
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(node.key, node.value);
        }
    }

    /// Unlink a slot and release it, keeping map and usage in sync
    fn detach(&mut self, idx: usize) -> Option<Node<V>> {
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        self.map.remove(&node.key);
        self.used_bytes -= node.size();
        Some(node)
    }

    /// Place a node in a free slot (or a new one) and return its index
    fn store(&mut self, node: Node<V>) -> usize {
        match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.link_front(idx);
        }
    }

    /// Make a detached slot the new head
    fn link_front(&mut self, idx: usize) {
        let old_head = self.head.replace(idx);
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }

        match old_head.and_then(|h| self.nodes[h].as_mut()) {
            Some(head) => head.prev = Some(idx),
            None => self.tail = Some(idx),
        }
    }

    /// Splice a slot out of the list; its own links are left stale
    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.nodes[idx].as_ref().map(|n| (n.prev, n.next)) else {
            return;
        };

        match prev.and_then(|p| self.nodes[p].as_mut()) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes[n].as_mut()) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<V> fmt::Debug for EvictionCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionCache")
            .field("len", &self.map.len())
            .field("used_bytes", &self.used_bytes)
            .field("max_bytes", &self.max_bytes)
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}

/// Iterator over cache entries in recency order
pub struct Iter<'a, V> {
    nodes: &'a [Option<Node<V>>],
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some((node.key.as_str(), &node.value))
    }
}
