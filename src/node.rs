use crate::blockchain::{Block, Ledger};
use crate::config::Config;
use crate::discovery::NodeRegistry;
use crate::error::Result;
use crate::gossip::{GossipEvent, GossipNotifier};
use crate::mempool::Mempool;
use crate::miner::mine_blocking;
use crate::network::PeerClient;
use crate::sync::ConsensusResolver;
use crate::transaction::{Transaction, TransactionRequest};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeState {
    Booting,
    Syncing,
    Ready,
}

/// Composition root: owns the ledger, mempool and peer machinery and exposes
/// the operations served over HTTP.
pub struct Node {
    config: Config,
    identity: String,
    ledger: Arc<RwLock<Ledger>>,
    mempool: Arc<RwLock<Mempool>>,
    registry: Arc<NodeRegistry>,
    gossip: GossipNotifier,
    resolver: ConsensusResolver,
    mining: Mutex<()>,
    state: RwLock<NodeState>,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let identity = Uuid::new_v4().simple().to_string();
        let client = PeerClient::new(config.peer_timeout())?;
        let registry = Arc::new(NodeRegistry::new(&config.node_address, &config.seed_peers));
        let ledger = Arc::new(RwLock::new(Ledger::new()));
        let mempool = Arc::new(RwLock::new(Mempool::new(&config.node_address)));
        let gossip = GossipNotifier::new(registry.clone(), client.clone());
        let resolver = ConsensusResolver::new(
            ledger.clone(),
            mempool.clone(),
            registry.clone(),
            client,
            gossip.clone(),
        );

        info!(
            address = %registry.self_address(),
            identity = %identity,
            seed_peers = registry.len(),
            "node initialised"
        );

        Ok(Self {
            config,
            identity,
            ledger,
            mempool,
            registry,
            gossip,
            resolver,
            mining: Mutex::new(()),
            state: RwLock::new(NodeState::Booting),
        })
    }

    /// Process-lifetime id; the recipient of this node's mining rewards.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn address(&self) -> &str {
        self.registry.self_address()
    }

    pub async fn state(&self) -> NodeState {
        *self.state.read().await
    }

    async fn set_state(&self, state: NodeState) {
        *self.state.write().await = state;
    }

    /// Snapshot of the current chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.ledger.read().await.chain().to_vec()
    }

    pub async fn chain_len(&self) -> usize {
        self.ledger.read().await.len()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.mempool.read().await.pending().to_vec()
    }

    pub fn peers(&self) -> Vec<String> {
        self.registry.peers()
    }

    /// Accepts a client or peer transaction.
    ///
    /// Returns the index of the block the transaction is expected to land in,
    /// or `None` when it was absorbed as a duplicate, a gossip echo or an
    /// already confirmed id.
    /// Malformed requests are the only error.
    pub async fn submit_transaction(
        &self,
        request: TransactionRequest,
        origin: Option<&str>,
    ) -> Result<Option<u64>> {
        let tx = request.into_transaction()?;

        let next_index = {
            let ledger = self.ledger.read().await;
            if ledger.is_confirmed(&tx.id) {
                debug!(tx_id = %tx.id, origin = ?origin, "transaction already confirmed");
                return Ok(None);
            }
            if !self.mempool.write().await.add(tx.clone(), origin) {
                return Ok(None);
            }
            ledger.len() as u64 + 1
        };

        debug!(tx_id = %tx.id, origin = ?origin, "transaction accepted");
        self.gossip.broadcast(GossipEvent::TransactionCreated(tx), origin);

        Ok(Some(next_index))
    }

    /// Searches for the next proof off the async workers, then appends a
    /// block paying ourselves the reward. One mining pass runs at a time.
    ///
    /// Nothing is written until the proof is found, so a cancelled or failed
    /// pass leaves the pool untouched.
    pub async fn mine_block(&self) -> Result<Block> {
        let _mining = self.mining.lock().await;

        loop {
            let (last_proof, tip_hash) = {
                let ledger = self.ledger.read().await;
                let last = ledger.last_block();
                (last.proof, last.hash()?)
            };

            let proof = mine_blocking(last_proof).await?;

            let mut ledger = self.ledger.write().await;
            if ledger.last_block().hash()? != tip_hash {
                warn!("chain tip changed while mining, searching again");
                continue;
            }
            let block = {
                let mut mempool = self.mempool.write().await;
                // self-mined reward: never gossiped
                mempool.add(Transaction::reward(&self.identity), None);
                ledger.new_block(proof, &mut mempool)?
            };
            drop(ledger);

            info!(index = block.index, proof = block.proof, "mined block");
            self.gossip.broadcast(GossipEvent::ChainUpdated, None);
            return Ok(block);
        }
    }

    /// Registers every non-empty address; returns how many were new.
    pub fn register_peers(&self, addresses: &[String]) -> usize {
        addresses
            .iter()
            .filter(|addr| !addr.trim().is_empty())
            .filter(|addr| self.registry.register(addr, &self.gossip))
            .count()
    }

    /// Runs consensus against all known peers.
    pub async fn resolve(&self) -> bool {
        self.resolver.resolve(false).await
    }

    /// Startup join: announce, sync peers, adopt the best chain.
    pub async fn join(&self) -> bool {
        self.set_state(NodeState::Syncing).await;
        let replaced = self.resolver.join().await;
        self.set_state(NodeState::Ready).await;

        info!(
            peers = self.registry.len(),
            chain_len = self.chain_len().await,
            replaced,
            "joined network"
        );
        replaced
    }

    /// Serves the HTTP API on the configured listen address, then joins the
    /// network. Resolves when the server stops.
    #[cfg(feature = "api")]
    pub async fn start(self: Arc<Self>) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.listen)
            .await
            .map_err(|e| {
                crate::error::ChainError::NetworkError(format!(
                    "binding {}: {}",
                    self.config.listen, e
                ))
            })?;
        info!(listen = %self.config.listen, "API server listening");

        let server = tokio::spawn(crate::api::serve(listener, self.clone()));
        self.join().await;

        match server.await {
            Ok(result) => result,
            Err(e) => Err(crate::error::ChainError::NetworkError(format!(
                "API server task failed: {}",
                e
            ))),
        }
    }
}
