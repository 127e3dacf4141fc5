//! A minimal append-only ledger secured by hash chaining, Ed25519 signatures
//! and proof-of-work.

pub mod blockchain;
pub mod config;

pub use blockchain::{Address, Block, Blockchain, Transaction, Wallet};
pub use config::ChainConfig;
