//! Hashing primitives for PeerChain
//!
//! Two digests are used by the ledger:
//! - the canonical block hash linking each block to its predecessor
//! - the proof-of-work predicate over a pair of consecutive proofs

use crate::error::{ChainError, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex suffix a proof digest must end with.
pub const PROOF_SUFFIX: &str = "0000";

pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Renders the top-level fields of `value` as `key=value` pairs sorted by key
/// and joined by `&`. Strings are rendered raw, everything else as JSON.
pub fn canonical_string<T: Serialize>(value: &T) -> Result<String> {
    let fields = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        other => {
            return Err(ChainError::SerializationError(format!(
                "canonical form needs an object, got {}",
                other
            )))
        }
    };

    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        let rendered = match &fields[key.as_str()] {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        parts.push(format!("{}={}", key, rendered));
    }
    Ok(parts.join("&"))
}

/// SHA-256 over the canonical string, hex encoded.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    Ok(sha256_hex(canonical_string(value)?))
}

/// True when `sha256("{last_proof}{proof}")` ends in [`PROOF_SUFFIX`].
///
/// The suffix (not prefix) check is part of the wire format: chains mined by
/// other nodes are validated with exactly this predicate.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    sha256_hex(guess).ends_with(PROOF_SUFFIX)
}
