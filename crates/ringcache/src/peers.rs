//! Peer routing contracts
//!
//! A shard asks a [`PeerPicker`] who owns a key, then fetches it through the
//! returned [`PeerGetter`]. Transports (RPC, HTTP, in-process) plug in by
//! implementing [`PeerGetter`]; nothing else in the crate knows about them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::ring::{HashFn, HashRing};
use crate::shard::ShardCache;

/// Fetch request sent to the owner of a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    /// Cache group (namespace) the key belongs to
    pub group: String,
    /// Key to fetch
    pub key: String,
}

impl Request {
    /// Build a request for `key` in `group`
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
        }
    }
}

/// Value returned by the owner of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Raw value bytes
    pub value: Bytes,
}

/// Fetches values from one remote peer
///
/// Called concurrently from many request threads. A returned error means the
/// fetch failed; retrying or falling back is up to the caller.
pub trait PeerGetter: Send + Sync {
    /// Fetch `request.key` from `request.group` on this peer
    fn get(&self, request: &Request) -> Result<Response>;
}

/// Chooses the peer that owns a key
pub trait PeerPicker: Send + Sync {
    /// Return the remote owner of `key`
    ///
    /// `None` means the key is owned by this process, or no peers are known.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Picker for a process running without peers: every key is local
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPicker;

impl PeerPicker for LocalPicker {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
        None
    }
}

struct RingState {
    ring: HashRing,
    getters: HashMap<String, Arc<dyn PeerGetter>, RandomState>,
}

/// Picker backed by a consistent hash ring
///
/// The ring always contains this process itself, so keys are spread over
/// `peers + 1` owners and keys landing on `self_id` are reported as local.
pub struct RingPicker {
    self_id: String,
    replicas: usize,
    hash: HashFn,
    state: RwLock<RingState>,
}

impl RingPicker {
    /// Create a picker with no remote peers, hashing with CRC-32 (IEEE)
    pub fn new(self_id: impl Into<String>, replicas: usize) -> Self {
        Self::with_hasher(self_id, replicas, crc32fast::hash)
    }

    /// Create a picker with a custom ring hash function
    pub fn with_hasher<F>(self_id: impl Into<String>, replicas: usize, hash: F) -> Self
    where
        F: Fn(&[u8]) -> u32 + Send + Sync + 'static,
    {
        let self_id = self_id.into();
        let hash: HashFn = Arc::new(hash);
        let mut ring = HashRing::with_hash_fn(replicas, Arc::clone(&hash));
        ring.add([self_id.as_str()]);

        Self {
            self_id,
            replicas,
            hash,
            state: RwLock::new(RingState {
                ring,
                getters: HashMap::with_hasher(RandomState::new()),
            }),
        }
    }

    /// Replace the remote peer set
    ///
    /// The ring is rebuilt from scratch and swapped in atomically, so
    /// concurrent `pick_peer` calls see either the old or the new peer set.
    /// An entry for `self_id` is ignored.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = (S, Arc<dyn PeerGetter>)>,
        S: Into<String>,
    {
        let mut getters: HashMap<String, Arc<dyn PeerGetter>, RandomState> =
            HashMap::with_hasher(RandomState::new());
        for (id, getter) in peers {
            let id = id.into();
            if id != self.self_id {
                getters.insert(id, getter);
            }
        }

        // Colliding positions go to the last registration, so every process
        // must register the same members in the same order
        let mut members: Vec<&str> = getters.keys().map(String::as_str).collect();
        members.push(self.self_id.as_str());
        members.sort_unstable();

        let mut ring = HashRing::with_hash_fn(self.replicas, Arc::clone(&self.hash));
        ring.add(members);

        debug!(
            self_id = %self.self_id,
            peers = getters.len(),
            "rebuilt peer ring"
        );

        *self.state.write() = RingState { ring, getters };
    }

    /// Identity of the owner of `key`, local or remote
    pub fn owner(&self, key: &str) -> Option<String> {
        self.state.read().ring.get(key).map(str::to_string)
    }

    /// This process's identity on the ring
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Identities of the registered remote peers, sorted
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.state.read().getters.keys().cloned().collect();
        peers.sort_unstable();
        peers
    }
}

impl PeerPicker for RingPicker {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        if owner == self.self_id {
            return None;
        }

        trace!(key, peer = owner, "picked remote peer");
        state.getters.get(owner).cloned()
    }
}

impl fmt::Debug for RingPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingPicker")
            .field("self_id", &self.self_id)
            .field("replicas", &self.replicas)
            .field("peers", &self.peers())
            .finish()
    }
}

/// In-process getter serving groups straight from [`ShardCache`]s
///
/// Stands in for a network transport when all "peers" live in one process.
#[derive(Clone, Default)]
pub struct LocalGetter {
    groups: HashMap<String, Arc<ShardCache>, RandomState>,
}

impl LocalGetter {
    /// Create a getter serving no groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `shard` under its group name
    pub fn with_group(mut self, shard: Arc<ShardCache>) -> Self {
        self.groups.insert(shard.group().to_string(), shard);
        self
    }
}

impl PeerGetter for LocalGetter {
    fn get(&self, request: &Request) -> Result<Response> {
        let shard = self
            .groups
            .get(&request.group)
            .ok_or_else(|| Error::UnknownGroup(request.group.clone()))?;

        let view = shard.get(&request.key).ok_or_else(|| Error::NotFound {
            group: request.group.clone(),
            key: request.key.clone(),
        })?;

        Ok(Response {
            value: Bytes::from(view.to_vec()),
        })
    }
}

impl fmt::Debug for LocalGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalGetter")
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteView;

    fn shard_with(group: &str, entries: &[(&str, &str)]) -> Arc<ShardCache> {
        let shard = Arc::new(ShardCache::new(group, 0));
        for (key, value) in entries {
            shard.add(*key, ByteView::from(*value));
        }
        shard
    }

    fn remote(getter: LocalGetter) -> Arc<dyn PeerGetter> {
        Arc::new(getter)
    }

    #[test]
    fn test_local_picker() {
        assert!(LocalPicker.pick_peer("x").is_none());
    }

    #[test]
    fn test_ring_picker_without_peers() {
        let picker = RingPicker::new("self", 50);

        assert!(picker.pick_peer("x").is_none());
        assert_eq!(picker.owner("x").as_deref(), Some("self"));
        assert!(picker.peers().is_empty());
    }

    #[test]
    fn test_ring_picker_never_returns_self() {
        let picker = RingPicker::new("node-a", 50);
        picker.set_peers([
            ("node-a", remote(LocalGetter::new())),
            ("node-b", remote(LocalGetter::new())),
        ]);

        assert_eq!(picker.peers(), vec!["node-b"]);

        let mut local = 0;
        let mut remote_owned = 0;
        for i in 0..1000 {
            let key = format!("key-{}", i);
            match picker.owner(&key).as_deref() {
                Some("node-a") => {
                    assert!(picker.pick_peer(&key).is_none());
                    local += 1;
                }
                Some("node-b") => {
                    assert!(picker.pick_peer(&key).is_some());
                    remote_owned += 1;
                }
                other => panic!("unexpected owner {:?}", other),
            }
        }

        assert!(local > 0);
        assert!(remote_owned > 0);
    }

    #[test]
    fn test_set_peers_replaces_ring() {
        let picker = RingPicker::new("node-a", 20);
        picker.set_peers([
            ("node-b", remote(LocalGetter::new())),
            ("node-c", remote(LocalGetter::new())),
        ]);
        picker.set_peers([("node-c", remote(LocalGetter::new()))]);

        assert_eq!(picker.peers(), vec!["node-c"]);
        for i in 0..500 {
            let owner = picker.owner(&format!("key-{}", i));
            assert_ne!(owner.as_deref(), Some("node-b"));
        }
    }

    #[test]
    fn test_ring_picker_custom_hash() {
        // Every virtual node collides at 0; the id sorting last owns it
        let picker = RingPicker::with_hasher("node-a", 1, |_| 0);
        picker.set_peers([("node-b", remote(LocalGetter::new()))]);

        assert_eq!(picker.owner("k").as_deref(), Some("node-b"));
        assert!(picker.pick_peer("k").is_some());
    }

    #[test]
    fn test_pickers_agree_on_colliding_positions() {
        // Every virtual node lands on 100 and every key hashes below it
        let colliding = |data: &[u8]| -> u32 {
            if data.starts_with(b"0") {
                100
            } else {
                50
            }
        };
        let members: Vec<String> = (0..8).map(|i| format!("peer-{}", i)).collect();

        let owners: Vec<Option<String>> = (0..20)
            .map(|i| {
                // Different self ids and registration orders, same membership
                let self_id = members[i % members.len()].clone();
                let picker = RingPicker::with_hasher(self_id, 1, colliding);
                let mut peers: Vec<(String, Arc<dyn PeerGetter>)> = members
                    .iter()
                    .map(|id| (id.clone(), remote(LocalGetter::new())))
                    .collect();
                peers.rotate_left(i % members.len());
                picker.set_peers(peers);
                picker.owner("k")
            })
            .collect();

        assert!(owners.iter().all(|owner| owner == &owners[0]));
        assert_eq!(owners[0].as_deref(), Some("peer-7"));
    }

    #[test]
    fn test_local_getter() {
        let getter = LocalGetter::new().with_group(shard_with("scores", &[("tom", "630")]));

        let response = getter.get(&Request::new("scores", "tom")).unwrap();
        assert_eq!(response.value, Bytes::from_static(b"630"));

        let err = getter.get(&Request::new("scores", "jack")).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref key, .. } if key == "jack"));

        let err = getter.get(&Request::new("users", "tom")).unwrap_err();
        assert!(matches!(err, Error::UnknownGroup(ref g) if g == "users"));
    }
}
