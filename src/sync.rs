//! Chain synchronization for PeerChain
//!
//! Consensus follows the longest valid chain rule: a peer's chain replaces
//! ours only when it is strictly longer and passes full validation. Peer
//! responses are reduced in arrival order, so among several candidates of the
//! same maximal length the first one to arrive wins.

use crate::blockchain::{validate_chain, Block, Ledger};
use crate::discovery::NodeRegistry;
use crate::gossip::{GossipEvent, GossipNotifier};
use crate::mempool::Mempool;
use crate::network::PeerClient;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct ConsensusResolver {
    ledger: Arc<RwLock<Ledger>>,
    mempool: Arc<RwLock<Mempool>>,
    registry: Arc<NodeRegistry>,
    client: PeerClient,
    gossip: GossipNotifier,
}

impl ConsensusResolver {
    pub fn new(
        ledger: Arc<RwLock<Ledger>>,
        mempool: Arc<RwLock<Mempool>>,
        registry: Arc<NodeRegistry>,
        client: PeerClient,
        gossip: GossipNotifier,
    ) -> Self {
        Self { ledger, mempool, registry, client, gossip }
    }

    /// Polls every known peer for its chain and adopts the best strictly
    /// longer valid one. Returns whether the local chain was replaced.
    ///
    /// After a replacement, peers are asked to resolve against us unless this
    /// is the startup pass of [`ConsensusResolver::join`].
    pub async fn resolve(&self, is_startup_join: bool) -> bool {
        let local_len = self.ledger.read().await.len();

        let winner = match self.best_candidate(local_len).await {
            Some(chain) => chain,
            None => {
                debug!(local_len, "no longer valid chain offered");
                return false;
            }
        };

        {
            let mut ledger = self.ledger.write().await;
            if winner.len() <= ledger.len() {
                debug!(
                    candidate_len = winner.len(),
                    local_len = ledger.len(),
                    "local chain caught up while resolving"
                );
                return false;
            }
            if let Err(e) = ledger.replace_chain(winner) {
                warn!(error = %e, "chain replacement failed");
                return false;
            }

            let pruned = self.mempool.write().await.retain_unconfirmed(&ledger);
            info!(length = ledger.len(), pruned, "adopted longer chain from peers");
        }

        if !is_startup_join {
            self.gossip.broadcast(GossipEvent::ChainUpdated, None);
        }
        true
    }

    async fn best_candidate(&self, local_len: usize) -> Option<Vec<Block>> {
        let peers = self.registry.peers();
        let client = &self.client;
        let mut responses: FuturesUnordered<_> = peers
            .iter()
            .map(|peer| async move { (peer, client.fetch_chain(peer).await) })
            .collect();

        let mut best: Option<Vec<Block>> = None;
        let mut best_len = local_len;

        while let Some((peer, result)) = responses.next().await {
            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "peer chain unavailable");
                    continue;
                }
            };

            let len = response.chain.len();
            if response.length != len {
                debug!(peer = %peer, reported = response.length, actual = len, "chain length mismatch");
            }
            if len <= best_len {
                continue;
            }
            if !validate_chain(&response.chain) {
                warn!(peer = %peer, length = len, "rejected invalid chain");
                continue;
            }

            best_len = len;
            best = Some(response.chain);
        }
        best
    }

    /// Startup protocol: announce ourselves to the configured peers, learn
    /// their peers, then adopt the best chain on offer.
    pub async fn join(&self) -> bool {
        let self_address = self.registry.self_address().to_string();
        let announce = self.gossip.broadcast(GossipEvent::PeerJoined(self_address), None);
        match announce.await {
            Ok(report) => info!(delivered = report.delivered, failed = report.failed, "announced to peers"),
            Err(e) => warn!(error = %e, "join announcement task failed"),
        }

        self.registry.sync_peers(&self.client).await;
        self.resolve(true).await
    }
}
