//! Peer discovery for PeerChain
//!
//! The registry keeps the set of peer addresses this node knows about. Peers
//! learn about each other in two ways:
//! - registration, which is re-broadcast so every node hears about a newcomer
//! - [`NodeRegistry::sync_peers`], which merges the peer lists of known peers

use crate::gossip::{GossipEvent, GossipNotifier};
use crate::network::{normalize_address, PeerClient};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct NodeRegistry {
    self_address: String,
    peers: RwLock<BTreeSet<String>>,
}

impl NodeRegistry {
    /// Registry seeded with `seeds`, minus this node's own address.
    pub fn new<I, S>(self_address: &str, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self {
            self_address: normalize_address(self_address),
            peers: RwLock::new(BTreeSet::new()),
        };
        registry.merge(seeds);
        registry
    }

    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    /// Known peers in address order.
    pub fn peers(&self) -> Vec<String> {
        self.peers.read().iter().cloned().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.read().contains(&normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Adds `address`; returns `false` if it is empty, our own, or known.
    pub fn insert(&self, address: &str) -> bool {
        let address = normalize_address(address);
        if address.is_empty() || address == self.self_address {
            return false;
        }
        self.peers.write().insert(address)
    }

    /// Unions `addresses` into the set; returns how many were new.
    pub fn merge<I, S>(&self, addresses: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .filter(|addr| self.insert(addr.as_ref()))
            .count()
    }

    /// Adds a peer and tells every other known peer about it. Known, empty
    /// and self addresses are ignored.
    pub fn register(&self, address: &str, gossip: &GossipNotifier) -> bool {
        if !self.insert(address) {
            debug!(peer = %address, "peer already known");
            return false;
        }
        let address = normalize_address(address);
        info!(peer = %address, "registered new peer");
        gossip.broadcast(GossipEvent::PeerJoined(address), None);
        true
    }

    /// Merges the peer list of every known peer into ours. Unreachable peers
    /// are skipped. Returns how many addresses were new.
    pub async fn sync_peers(&self, client: &PeerClient) -> usize {
        let peers = self.peers();
        let responses = join_all(peers.iter().map(|peer| async move {
            (peer, client.fetch_peers(peer).await)
        }))
        .await;

        let mut added = 0;
        for (peer, result) in responses {
            match result {
                Ok(list) => added += self.merge(list),
                Err(e) => warn!(peer = %peer, error = %e, "peer list unavailable"),
            }
        }
        if added > 0 {
            info!(added, known = self.len(), "peer set synced");
        }
        added
    }
}
