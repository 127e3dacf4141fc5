// Blockchain module
//
// This module contains the core ledger implementation including:
// - Hashing and proof of work
// - Signing keys and addresses
// - Transaction structure
// - Block structure
// - Blockchain structure

pub mod block;
pub mod chain;
pub mod crypto;
pub mod hash;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError, ValidationError};
pub use crypto::{Address, DigitalSignature, Wallet};
pub use transaction::{Transaction, TransactionError};
