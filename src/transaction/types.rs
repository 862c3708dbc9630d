/// Transaction types for PeerChain
use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::validate_request;

/// Sender recorded on mining reward transactions.
pub const SYSTEM_SENDER: &str = "0";

/// Amount credited to a miner for each block.
pub const MINING_REWARD: f64 = 1.0;

/// A value transfer between two identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Self {
        Transaction {
            id: id.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Reward paid by the system to `recipient` for mining a block.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Transaction::new(new_transaction_id(), SYSTEM_SENDER, recipient, MINING_REWARD)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }
}

/// Body of a transaction submission. Every field is optional on the wire so
/// missing values can be reported as a client error rather than a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

impl TransactionRequest {
    /// Validates the request and builds a transaction, generating an id when
    /// the caller did not supply one.
    pub fn into_transaction(self) -> Result<Transaction> {
        validate_request(&self)?;

        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => new_transaction_id(),
        };

        Ok(Transaction {
            id,
            sender: self.sender.unwrap_or_default(),
            recipient: self.recipient.unwrap_or_default(),
            amount: self.amount.unwrap_or_default(),
        })
    }
}

impl From<Transaction> for TransactionRequest {
    fn from(tx: Transaction) -> Self {
        TransactionRequest {
            id: Some(tx.id),
            sender: Some(tx.sender),
            recipient: Some(tx.recipient),
            amount: Some(tx.amount),
        }
    }
}

pub fn new_transaction_id() -> String {
    Uuid::new_v4().simple().to_string()
}
