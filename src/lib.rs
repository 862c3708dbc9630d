//! PeerChain - a minimal peer-to-peer proof-of-work ledger node
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the local chain and chain validation
//! - [`transaction`] - Transaction types and request validation
//! - [`mempool`] - Pending transaction pool
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work search
//! - [`sync`] - Longest-valid-chain resolution against peers
//!
//! ## Cryptography
//! - [`crypto`] - Canonical block hashing and the proof predicate
//!
//! ## Networking
//! - [`network`] - Peer HTTP client and wire types
//! - [`discovery`] - Peer registry and peer-list sync
//! - [`gossip`] - Fire-and-forget event broadcast
//!
//! ## Node & Integration
//! - [`node`] - Composition root
//! - [`api`] - HTTP routes (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;
pub mod sync;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Networking
// ============================================================================
pub mod discovery;
pub mod gossip;
pub mod network;

// ============================================================================
// Node & Integration
// ============================================================================
pub mod node;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
