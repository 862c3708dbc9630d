//! Best-effort broadcast of node events to peers
//!
//! A broadcast never fails from the caller's point of view: it is spawned as a
//! background task, each peer is contacted concurrently under the client's
//! request timeout, and failures are logged and dropped.

use crate::discovery::NodeRegistry;
use crate::error::Result;
use crate::network::{normalize_address, PeerClient};
use crate::transaction::Transaction;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum GossipEvent {
    /// A new peer address became known.
    PeerJoined(String),
    /// A transaction entered our mempool.
    TransactionCreated(Transaction),
    /// Our chain grew or was replaced; peers should re-run consensus.
    ChainUpdated,
}

impl GossipEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GossipEvent::PeerJoined(_) => "peerJoined",
            GossipEvent::TransactionCreated(_) => "transactionCreated",
            GossipEvent::ChainUpdated => "chainUpdated",
        }
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GossipReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct GossipNotifier {
    registry: Arc<NodeRegistry>,
    client: PeerClient,
}

impl GossipNotifier {
    pub fn new(registry: Arc<NodeRegistry>, client: PeerClient) -> Self {
        Self { registry, client }
    }

    /// Peers that should hear about `event`: every known peer except
    /// ourselves, the origin of a forwarded transaction, and the subject of a
    /// join announcement.
    pub fn targets(&self, event: &GossipEvent, origin: Option<&str>) -> Vec<String> {
        let origin = origin.map(normalize_address);
        let self_address = self.registry.self_address();

        self.registry
            .peers()
            .into_iter()
            .filter(|peer| peer != self_address)
            .filter(|peer| match event {
                GossipEvent::TransactionCreated(_) => origin.as_deref() != Some(peer.as_str()),
                GossipEvent::PeerJoined(joined) => joined != peer,
                GossipEvent::ChainUpdated => true,
            })
            .collect()
    }

    /// Sends `event` to all targets in the background. The handle resolves
    /// to a delivery report; dropping it is fine.
    pub fn broadcast(&self, event: GossipEvent, origin: Option<&str>) -> JoinHandle<GossipReport> {
        let targets = self.targets(&event, origin);
        let client = self.client.clone();
        let self_address = self.registry.self_address().to_string();

        tokio::spawn(async move {
            let results = join_all(
                targets
                    .iter()
                    .map(|peer| deliver(&client, peer, &event, &self_address)),
            )
            .await;

            let mut report = GossipReport::default();
            for (peer, result) in targets.iter().zip(results) {
                match result {
                    Ok(()) => {
                        report.delivered += 1;
                        debug!(peer = %peer, event = event.kind(), "gossip delivered");
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(peer = %peer, event = event.kind(), error = %e, "gossip dropped");
                    }
                }
            }
            report
        })
    }
}

async fn deliver(
    client: &PeerClient,
    peer: &str,
    event: &GossipEvent,
    self_address: &str,
) -> Result<()> {
    match event {
        GossipEvent::PeerJoined(address) => {
            client.announce_peers(peer, std::slice::from_ref(address)).await
        }
        GossipEvent::TransactionCreated(tx) => client.send_transaction(peer, tx, self_address).await,
        GossipEvent::ChainUpdated => client.request_resolve(peer).await.map(|_| ()),
    }
}
