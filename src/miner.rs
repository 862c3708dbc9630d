//! Proof-of-work search
//!
//! Mining is a brute-force scan over candidate proofs. It is CPU bound and has
//! no upper bound on running time, so async callers run it through
//! [`mine_blocking`] on tokio's blocking pool.

use crate::crypto::valid_proof;
use crate::error::{ChainError, Result};
use std::time::Instant;
use tracing::debug;

/// Smallest non-negative proof satisfying [`valid_proof`] against `last_proof`.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let started = Instant::now();
    let mut proof = 0u64;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    debug!(
        last_proof,
        proof,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "proof found"
    );
    proof
}

/// Runs [`proof_of_work`] off the async worker threads.
pub async fn mine_blocking(last_proof: u64) -> Result<u64> {
    tokio::task::spawn_blocking(move || proof_of_work(last_proof))
        .await
        .map_err(|e| ChainError::InvalidBlock(format!("mining task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_of_work_returns_smallest_proof() {
        let proof = proof_of_work(1);
        assert_eq!(proof, 12370);
        assert!(valid_proof(1, proof));
        assert!((0..proof).all(|p| !valid_proof(1, p)));
    }

    #[test]
    fn test_proof_depends_on_last_proof() {
        assert_eq!(proof_of_work(100), 33575);
    }

    #[tokio::test]
    async fn test_mine_blocking() {
        tokio::time::timeout(std::time::Duration::from_secs(30), async {
            assert_eq!(mine_blocking(1).await.unwrap(), 12370);
        })
        .await
        .expect("test_mine_blocking timed out");
    }
}
