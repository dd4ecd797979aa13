//! Consistent hash ring
//!
//! Every peer is placed on a 32-bit ring at `replicas` positions (virtual
//! nodes). A key belongs to the first virtual node at or after its own hash,
//! wrapping around past the largest position.
//!
//! ```text
//!   0 ──── vA0 ──── vB1 ──── vA2 ──── vB0 ──── vB2 ──── vA1 ──── 2^32
//!              ▲
//!       hash("alpha") ─► next position is vB1 ─► owner "peerB"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use tracing::debug;

/// Hash function used to place peers and keys on the ring
///
/// Must be deterministic for the lifetime of the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Maps keys to peer identities
///
/// Not synchronized; build it before sharing, or guard it with a lock
/// (see [`RingPicker`](crate::RingPicker)).
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual node positions
    keys: Vec<u32>,
    /// Virtual node position -> peer identity
    owners: HashMap<u32, String, RandomState>,
    /// Every peer passed to `add`, including ones that lost all positions
    registered: Vec<String>,
}

impl HashRing {
    /// Create an empty ring hashing with CRC-32 (IEEE)
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Create an empty ring with a custom hash function
    pub fn with_hasher<F>(replicas: usize, hash: F) -> Self
    where
        F: Fn(&[u8]) -> u32 + Send + Sync + 'static,
    {
        Self::with_hash_fn(replicas, Arc::new(hash))
    }

    /// Create an empty ring sharing an existing hash function
    pub fn with_hash_fn(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas,
            keys: Vec::new(),
            owners: HashMap::with_hasher(RandomState::new()),
            registered: Vec::new(),
        }
    }

    /// Register peers, placing `replicas` virtual nodes for each
    ///
    /// Virtual node `i` of peer `p` sits at `hash(format!("{i}{p}"))`.
    /// Registering the same peer twice duplicates its virtual nodes.
    pub fn add<I>(&mut self, peers: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut added = 0usize;
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.keys.push(position);
                self.owners.insert(position, peer.to_string());
            }
            self.registered.push(peer.to_string());
            added += 1;
        }
        self.keys.sort_unstable();

        debug!(
            peers = added,
            virtual_nodes = self.keys.len(),
            "added peers to hash ring"
        );
    }

    /// Find the peer owning `key`, or `None` if the ring is empty
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&position| position < hash);
        let position = self.keys[idx % self.keys.len()];

        self.owners.get(&position).map(String::as_str)
    }

    /// Check if no peer is registered
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of virtual nodes on the ring
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Virtual nodes per peer
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Distinct registered peers, sorted
    ///
    /// Includes peers whose every virtual node was taken over by a later
    /// registration at the same position.
    pub fn peers(&self) -> Vec<&str> {
        let mut peers: Vec<&str> = self.registered.iter().map(String::as_str).collect();
        peers.sort_unstable();
        peers.dedup();
        peers
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.keys.len())
            .field("peers", &self.peers())
            .finish()
    }
}
