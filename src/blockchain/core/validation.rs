use crate::crypto::valid_proof;
use tracing::debug;

use super::chain::Block;

/// Checks every adjacent pair of `chain`: the later block must store the
/// earlier block's hash and carry a proof valid against the earlier proof.
/// Empty and single-block chains are valid.
pub fn validate_chain(chain: &[Block]) -> bool {
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        let expected = match previous.hash() {
            Ok(hash) => hash,
            Err(e) => {
                debug!(index = previous.index, error = %e, "block cannot be hashed");
                return false;
            }
        };
        if current.previous_hash != expected {
            debug!(index = current.index, "previousHash does not match predecessor");
            return false;
        }
        if !valid_proof(previous.proof, current.proof) {
            debug!(index = current.index, proof = current.proof, "invalid proof of work");
            return false;
        }
    }
    true
}
