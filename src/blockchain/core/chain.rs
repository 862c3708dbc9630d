use crate::crypto::canonical_hash;
use crate::error::{ChainError, Result};
use crate::mempool::Mempool;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

pub const GENESIS_INDEX: u64 = 1;
pub const GENESIS_PROOF: u64 = 1;
/// Sentinel kept for wire compatibility; it is not the hash of anything.
pub const GENESIS_PREVIOUS_HASH: &str = "100";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn genesis() -> Self {
        Block {
            index: GENESIS_INDEX,
            timestamp: chrono::Utc::now().timestamp(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// Canonical hash of the block, the value the next block stores as
    /// `previousHash`.
    pub fn hash(&self) -> Result<String> {
        canonical_hash(self)
    }
}

/// The local chain. Always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
    /// Ids of every transaction included in `blocks`.
    confirmed: HashSet<String>,
}

fn confirmed_ids(blocks: &[Block]) -> HashSet<String> {
    blocks
        .iter()
        .flat_map(|block| block.transactions.iter())
        .map(|tx| tx.id.clone())
        .collect()
}

impl Ledger {
    pub fn new() -> Self {
        let mut ledger = Ledger {
            blocks: Vec::new(),
            confirmed: HashSet::new(),
        };
        ledger.create_genesis();
        ledger
    }

    fn create_genesis(&mut self) {
        let genesis = Block::genesis();
        info!(timestamp = genesis.timestamp, "genesis block created");
        self.blocks.push(genesis);
    }

    /// Appends a block carrying every pending transaction in `mempool`,
    /// sealed with `proof` and linked to the current tip.
    pub fn new_block(&mut self, proof: u64, mempool: &mut Mempool) -> Result<Block> {
        let previous_hash = self.last_block().hash()?;
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: chrono::Utc::now().timestamp(),
            transactions: mempool.drain_for_block(),
            proof,
            previous_hash,
        };

        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            rewards = block.transactions.iter().filter(|tx| tx.is_reward()).count(),
            "block appended"
        );
        self.confirmed
            .extend(block.transactions.iter().map(|tx| tx.id.clone()));
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Swaps in `candidate` as the local chain. Callers validate first.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<()> {
        if candidate.is_empty() {
            return Err(ChainError::InvalidBlock(
                "refusing to replace the chain with an empty one".to_string(),
            ));
        }
        info!(old_len = self.blocks.len(), new_len = candidate.len(), "chain replaced");
        self.confirmed = confirmed_ids(&candidate);
        self.blocks = candidate;
        Ok(())
    }

    /// Whether a transaction with `id` is already in a block.
    pub fn is_confirmed(&self, id: &str) -> bool {
        self.confirmed.contains(id)
    }

    pub fn chain(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        // the genesis block is pushed in `new` and replace_chain refuses empty chains
        &self.blocks[self.blocks.len() - 1]
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::validate_chain;
    use crate::miner::proof_of_work;

    #[test]
    fn test_genesis_block() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);

        let genesis = ledger.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 1);
        assert_eq!(genesis.previous_hash, "100");
        assert!(genesis.transactions.is_empty());
    }

    #[test]
    fn test_new_block_links_to_tip_and_drains_mempool() {
        let mut ledger = Ledger::new();
        let mut mempool = Mempool::new("http://127.0.0.1:5000");
        mempool.add(Transaction::new("t1", "A", "B", 10.0), None);

        let genesis_hash = ledger.last_block().hash().unwrap();
        let proof = proof_of_work(ledger.last_block().proof);
        let block = ledger.new_block(proof, &mut mempool).unwrap();

        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.transactions.len(), 1);
        assert!(mempool.is_empty());
        assert_eq!(ledger.len(), 2);
        assert!(validate_chain(ledger.chain()));
        assert!(ledger.is_confirmed("t1"));
    }

    #[test]
    fn test_block_wire_shape() {
        let json = serde_json::to_value(Block::genesis()).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["proof"], 1);
        assert_eq!(json["previousHash"], "100");
        assert!(json["timestamp"].is_number());
        assert!(json["transactions"].is_array());
    }

    #[test]
    fn test_hash_is_stable() {
        let block = Block::genesis();
        assert_eq!(block.hash().unwrap(), block.clone().hash().unwrap());
        assert_eq!(block.hash().unwrap().len(), 64);
    }

    #[test]
    fn test_replace_chain_rejects_empty() {
        let mut ledger = Ledger::new();
        assert!(ledger.replace_chain(Vec::new()).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_replace_chain_rebuilds_confirmed_ids() {
        let mut ledger = Ledger::new();
        let mut mempool = Mempool::new("http://127.0.0.1:5000");
        mempool.add(Transaction::new("ours", "A", "B", 1.0), None);
        let proof = proof_of_work(ledger.last_block().proof);
        ledger.new_block(proof, &mut mempool).unwrap();
        assert!(ledger.is_confirmed("ours"));

        let mut other = Ledger::new();
        mempool.add(Transaction::new("theirs", "C", "D", 2.0), None);
        let proof = proof_of_work(other.last_block().proof);
        other.new_block(proof, &mut mempool).unwrap();

        ledger.replace_chain(other.chain().to_vec()).unwrap();
        assert!(ledger.is_confirmed("theirs"));
        assert!(!ledger.is_confirmed("ours"));
    }
}
