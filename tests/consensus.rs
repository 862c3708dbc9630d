#![cfg(feature = "api")]
//! Multi-node tests over real loopback HTTP
//!
//! Each node gets its own listener on an ephemeral port so nodes reach each
//! other exactly as they would across machines.

use axum::{routing::get, Json, Router};
use peerchain::api;
use peerchain::config::Config;
use peerchain::network::ChainResponse;
use peerchain::node::{Node, NodeState};
use peerchain::transaction::TransactionRequest;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const TEST_TIMEOUT: Duration = Duration::from_secs(120);

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let address = format!("http://{}", listener.local_addr().expect("local addr"));
    (listener, address)
}

async fn spawn_node(seeds: &[String]) -> Arc<Node> {
    let (listener, address) = bind().await;
    let config = Config::new(address).with_seed_peers(seeds.iter().cloned());
    let node = Arc::new(Node::new(config).expect("Failed to create node"));
    tokio::spawn(api::serve(listener, node.clone()));
    node
}

/// Polls `check` until it holds, panicking after roughly ten seconds.
async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition never held: {}", what);
}

fn request(sender: &str, recipient: &str, amount: f64) -> TransactionRequest {
    TransactionRequest {
        id: None,
        sender: Some(sender.to_string()),
        recipient: Some(recipient.to_string()),
        amount: Some(amount),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_longer_valid_chain_replaces_local_chain() {
    tokio::time::timeout(TEST_TIMEOUT, async {
        let node_b = spawn_node(&[]).await;
        node_b.mine_block().await.unwrap();
        node_b.mine_block().await.unwrap();

        let node_a = spawn_node(&[node_b.address().to_string()]).await;
        assert_eq!(node_a.chain_len().await, 1);

        assert!(node_a.resolve().await);
        assert_eq!(node_a.chain_len().await, node_b.chain_len().await);
        assert_eq!(node_a.chain().await, node_b.chain().await);

        // Equal length now: nothing more to adopt
        assert!(!node_a.resolve().await);
    })
    .await
    .expect("test_longer_valid_chain_replaces_local_chain timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_equal_length_chain_is_not_adopted() {
    tokio::time::timeout(TEST_TIMEOUT, async {
        let node_b = spawn_node(&[]).await;
        let node_a = spawn_node(&[node_b.address().to_string()]).await;

        node_b.mine_block().await.unwrap();
        node_a.mine_block().await.unwrap();

        let before = node_a.chain().await;
        assert!(!node_a.resolve().await);
        assert_eq!(node_a.chain().await, before);
        assert_ne!(node_a.chain().await, node_b.chain().await);
    })
    .await
    .expect("test_equal_length_chain_is_not_adopted timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_invalid_longer_chain_is_rejected() {
    tokio::time::timeout(TEST_TIMEOUT, async {
        let honest = spawn_node(&[]).await;
        honest.mine_block().await.unwrap();
        honest.mine_block().await.unwrap();

        // Rewriting history in block 2 breaks block 3's previousHash link
        let mut chain = honest.chain().await;
        chain[1].transactions[0].amount += 5.0;
        let length = chain.len();
        let forged = ChainResponse { chain, length };

        let (listener, forger_address) = bind().await;
        let app = Router::new().route(
            "/chain",
            get(move || {
                let forged = forged.clone();
                async move { Json(forged) }
            }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await });

        let node_a = spawn_node(&[forger_address]).await;
        assert!(!node_a.resolve().await);
        assert_eq!(node_a.chain_len().await, 1);
    })
    .await
    .expect("test_invalid_longer_chain_is_rejected timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_announces_syncs_and_adopts() {
    tokio::time::timeout(TEST_TIMEOUT, async {
        let node_c = spawn_node(&[]).await;
        let node_b = spawn_node(&[node_c.address().to_string()]).await;
        node_b.mine_block().await.unwrap();

        let node_a = spawn_node(&[node_b.address().to_string()]).await;
        assert!(node_a.join().await);
        assert_eq!(node_a.state().await, NodeState::Ready);

        // B learned about A; A learned about C through B's peer list
        assert!(node_b.peers().contains(&node_a.address().to_string()));
        assert!(node_a.peers().contains(&node_c.address().to_string()));
        assert_eq!(node_a.chain().await, node_b.chain().await);

        // B re-broadcasts the join, so C hears about A too
        let c = node_c.clone();
        let a_addr = node_a.address().to_string();
        eventually("C knows A", || {
            let c = c.clone();
            let a_addr = a_addr.clone();
            async move { c.peers().contains(&a_addr) }
        })
        .await;
    })
    .await
    .expect("test_join_announces_syncs_and_adopts timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transactions_and_blocks_are_gossiped() {
    tokio::time::timeout(TEST_TIMEOUT, async {
        let node_b = spawn_node(&[]).await;
        let node_a = spawn_node(&[node_b.address().to_string()]).await;
        node_a.join().await;

        let index = node_a
            .submit_transaction(request("A", "B", 10.0), None)
            .await
            .unwrap();
        assert_eq!(index, Some(2));

        let b = node_b.clone();
        eventually("B receives the transaction", || {
            let b = b.clone();
            async move { b.pending_transactions().await.len() == 1 }
        })
        .await;
        assert_eq!(node_a.pending_transactions().await.len(), 1);
        assert_eq!(
            node_a.pending_transactions().await[0].id,
            node_b.pending_transactions().await[0].id
        );

        // B mines; its chainUpdated gossip makes A resolve and adopt the block,
        // which also clears the now-confirmed transaction from A's pool.
        let block = node_b.mine_block().await.unwrap();
        assert_eq!(block.transactions.len(), 2);

        let a = node_a.clone();
        eventually("A adopts B's block", || {
            let a = a.clone();
            async move { a.chain_len().await == 2 }
        })
        .await;
        assert_eq!(node_a.chain().await, node_b.chain().await);
        assert!(node_a.pending_transactions().await.is_empty());
    })
    .await
    .expect("test_transactions_and_blocks_are_gossiped timed out");
}
