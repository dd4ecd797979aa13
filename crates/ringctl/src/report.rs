//! Placement reports over a hash ring

use std::collections::BTreeMap;

use ringcache::HashRing;
use serde::Serialize;

/// Owner of one key
#[derive(Debug, Serialize)]
pub struct Placement {
    pub key: String,
    pub owner: Option<String>,
}

/// Number of sampled keys landing on one peer
#[derive(Debug, Serialize)]
pub struct Share {
    pub peer: String,
    pub keys: usize,
    pub fraction: f64,
}

#[derive(Debug, Serialize)]
pub struct Spread {
    pub samples: usize,
    pub virtual_nodes: usize,
    pub shares: Vec<Share>,
}

#[derive(Debug, Serialize)]
pub struct Remap {
    pub samples: usize,
    pub moved: usize,
    pub fraction: f64,
    /// Where the moved keys went
    pub moved_to: Vec<Share>,
}

fn sample_keys(samples: usize) -> impl Iterator<Item = String> {
    (0..samples).map(|i| format!("key-{}", i))
}

fn fraction(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn shares(counts: BTreeMap<String, usize>, total: usize) -> Vec<Share> {
    counts
        .into_iter()
        .map(|(peer, keys)| Share {
            peer,
            keys,
            fraction: fraction(keys, total),
        })
        .collect()
}

pub fn owners(ring: &HashRing, keys: &[String]) -> Vec<Placement> {
    keys.iter()
        .map(|key| Placement {
            key: key.clone(),
            owner: ring.get(key).map(str::to_string),
        })
        .collect()
}

/// Share of `samples` synthetic keys owned by each peer
pub fn spread(ring: &HashRing, samples: usize) -> Spread {
    let mut counts: BTreeMap<String, usize> =
        ring.peers().into_iter().map(|p| (p.to_string(), 0)).collect();

    for key in sample_keys(samples) {
        if let Some(owner) = ring.get(&key) {
            *counts.entry(owner.to_string()).or_default() += 1;
        }
    }

    Spread {
        samples,
        virtual_nodes: ring.len(),
        shares: shares(counts, samples),
    }
}

/// How many sampled keys change owner once `added` peers join
pub fn remap(ring: &HashRing, added: &[String], samples: usize) -> Remap {
    let mut grown = ring.clone();
    grown.add(added);

    let mut moved = 0;
    let mut moved_to: BTreeMap<String, usize> = BTreeMap::new();
    for key in sample_keys(samples) {
        let before = ring.get(&key);
        let after = grown.get(&key);
        if before != after {
            moved += 1;
            if let Some(owner) = after {
                *moved_to.entry(owner.to_string()).or_default() += 1;
            }
        }
    }

    Remap {
        samples,
        moved,
        fraction: fraction(moved, samples),
        moved_to: shares(moved_to, moved),
    }
}
