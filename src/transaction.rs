//! Transaction module split into types and validation

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::validate_request;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    fn request(sender: Option<&str>, recipient: Option<&str>, amount: Option<f64>) -> TransactionRequest {
        TransactionRequest {
            id: None,
            sender: sender.map(str::to_string),
            recipient: recipient.map(str::to_string),
            amount,
        }
    }

    #[test]
    fn test_request_assigns_id_when_absent() {
        let tx = request(Some("A"), Some("B"), Some(10.0)).into_transaction().unwrap();
        assert_eq!(tx.sender, "A");
        assert_eq!(tx.recipient, "B");
        assert_eq!(tx.amount, 10.0);
        assert_eq!(tx.id.len(), 32);

        let other = request(Some("A"), Some("B"), Some(10.0)).into_transaction().unwrap();
        assert_ne!(tx.id, other.id);
    }

    #[test]
    fn test_request_keeps_supplied_id() {
        let mut req = request(Some("A"), Some("B"), Some(1.5));
        req.id = Some("tx-1".to_string());
        assert_eq!(req.into_transaction().unwrap().id, "tx-1");
    }

    #[test]
    fn test_missing_fields_rejected() {
        let cases = [
            request(None, Some("B"), Some(1.0)),
            request(Some("A"), None, Some(1.0)),
            request(Some("A"), Some("B"), None),
            request(Some(""), Some("B"), Some(1.0)),
            request(Some("A"), Some("B"), Some(0.0)),
        ];
        for req in cases {
            assert!(matches!(req.into_transaction(), Err(ChainError::InvalidTransaction(_))));
        }
    }

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("node-1");
        assert!(tx.is_reward());
        assert_eq!(tx.sender, SYSTEM_SENDER);
        assert_eq!(tx.recipient, "node-1");
        assert_eq!(tx.amount, MINING_REWARD);
    }

    #[test]
    fn test_wire_shape() {
        let tx = Transaction::new("t1", "A", "B", 10.0);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["sender"], "A");
        assert_eq!(json["recipient"], "B");
        assert_eq!(json["amount"], 10.0);
    }
}
