use crate::error::ChainError;

use super::types::TransactionRequest;

/// Rejects requests with a missing or empty sender, recipient or amount.
/// An amount of zero or a non-finite amount counts as missing.
pub fn validate_request(req: &TransactionRequest) -> Result<(), ChainError> {
    let mut missing = Vec::new();

    if req.sender.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("sender");
    }
    if req.recipient.as_deref().map_or(true, |r| r.trim().is_empty()) {
        missing.push("recipient");
    }
    match req.amount {
        Some(amount) if amount.is_finite() && amount != 0.0 => {}
        _ => missing.push("amount"),
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChainError::InvalidTransaction(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}
