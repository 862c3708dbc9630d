//! Peer-to-peer HTTP client and wire types
//!
//! Every node serves the same small set of endpoints, so the shapes defined
//! here are used both when answering peers and when calling them.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the address of the node that forwarded a transaction.
pub const ORIGIN_HEADER: &str = "x-origin-peer";

pub const CHAIN_PATH: &str = "/chain";
pub const NODES_PATH: &str = "/nodes";
pub const RESOLVE_PATH: &str = "/nodes/resolve";
pub const TRANSACTIONS_PATH: &str = "/transactions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: u8,
}

impl OkResponse {
    pub fn from_bool(ok: bool) -> Self {
        OkResponse { ok: ok as u8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub index: Option<u64>,
}

/// Canonical form of a peer address: trimmed, without trailing slashes.
pub fn normalize_address(address: &str) -> String {
    address.trim().trim_end_matches('/').to_string()
}

fn endpoint(peer: &str, path: &str) -> String {
    let base = normalize_address(peer);
    if base.contains("://") {
        format!("{}{}", base, path)
    } else {
        format!("http://{}{}", base, path)
    }
}

/// Outbound calls to other nodes. Cloning is cheap; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    /// Every request made through this client gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::NetworkError(format!("building HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    pub async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse> {
        let resp = self
            .http
            .get(endpoint(peer, CHAIN_PATH))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn fetch_peers(&self, peer: &str) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(endpoint(peer, NODES_PATH))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Forwards `tx` to `peer`, tagged with `origin` so the peer does not
    /// send it straight back.
    pub async fn send_transaction(&self, peer: &str, tx: &Transaction, origin: &str) -> Result<()> {
        self.http
            .post(endpoint(peer, TRANSACTIONS_PATH))
            .header(ORIGIN_HEADER, origin)
            .json(tx)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn announce_peers(&self, peer: &str, addresses: &[String]) -> Result<()> {
        self.http
            .post(endpoint(peer, NODES_PATH))
            .json(addresses)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Asks `peer` to run consensus; returns whether it replaced its chain.
    pub async fn request_resolve(&self, peer: &str) -> Result<bool> {
        let resp: OkResponse = self
            .http
            .get(endpoint(peer, RESOLVE_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.ok == 1)
    }
}
