//! Pending transaction pool
//!
//! Transactions wait here until the next block is created. The pool is keyed
//! by transaction id so gossip echoes and client retries are absorbed.

use crate::blockchain::Ledger;
use crate::network::normalize_address;
use crate::transaction::Transaction;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Mempool {
    node_address: String,
    pending: Vec<Transaction>,
    ids: HashSet<String>,
}

impl Mempool {
    pub fn new(node_address: impl AsRef<str>) -> Self {
        Self {
            node_address: normalize_address(node_address.as_ref()),
            pending: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Queue `tx` for the next block.
    ///
    /// Returns `false` without touching the pool when a transaction with the
    /// same id is already pending, or when `origin` is this node (a gossip
    /// echo of our own broadcast).
    pub fn add(&mut self, tx: Transaction, origin: Option<&str>) -> bool {
        if let Some(origin) = origin {
            if normalize_address(origin) == self.node_address {
                debug!(tx_id = %tx.id, "dropping transaction gossiped back to its origin");
                return false;
            }
        }
        if self.ids.contains(&tx.id) {
            debug!(tx_id = %tx.id, "transaction already pending");
            return false;
        }

        self.ids.insert(tx.id.clone());
        self.pending.push(tx);
        true
    }

    /// Hands the whole pending sequence to a new block and empties the pool.
    pub(crate) fn drain_for_block(&mut self) -> Vec<Transaction> {
        self.ids.clear();
        std::mem::take(&mut self.pending)
    }

    /// Drops pending transactions already confirmed in `ledger`.
    /// Returns how many were removed.
    pub fn retain_unconfirmed(&mut self, ledger: &Ledger) -> usize {
        let before = self.pending.len();
        self.pending.retain(|tx| !ledger.is_confirmed(&tx.id));
        self.ids = self.pending.iter().map(|tx| tx.id.clone()).collect();
        before - self.pending.len()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
