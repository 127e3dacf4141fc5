use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::hash::DigestBuilder;
use super::pow;
use super::transaction::Transaction;

/// Creation time of the genesis block, 2017-01-01T00:00:00Z
const GENESIS_TIMESTAMP_SECS: i64 = 1_483_228_800;

/// Previous hash recorded in the genesis block
const GENESIS_PREVIOUS_HASH: &str = "0";

/// Represents a block in the blockchain.
///
/// Field order is the canonical serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Hash of the previous block
    pub previous_hash: String,

    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Transactions included in this block, in insertion order
    pub transactions: Vec<Transaction>,

    /// Hash of the current block
    pub hash: String,

    /// Proof of work
    pub nonce: u64,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `transactions` - The transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    pub fn new(transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Self::with_timestamp(Utc::now(), transactions, previous_hash)
    }

    /// Creates a new block with an explicit timestamp. The hash is computed at nonce 0.
    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Self {
        let block = Block {
            previous_hash,
            timestamp,
            transactions,
            hash: String::new(),
            nonce: 0,
        };

        let hash = block.calculate_hash();

        Block { hash, ..block }
    }

    /// The fixed first block of every chain. It is never mined.
    pub fn genesis() -> Self {
        let timestamp = DateTime::from_timestamp(GENESIS_TIMESTAMP_SECS, 0).unwrap_or_default();
        Self::with_timestamp(timestamp, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Calculates the SHA-256 hash of the block's content and nonce
    pub fn calculate_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    /// Calculates the hash the block would have with `nonce`
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let builder = DigestBuilder::new()
            .field(&self.previous_hash)
            .field(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .field((self.transactions.len() as u64).to_le_bytes());

        self.transactions
            .iter()
            .fold(builder, |builder, transaction| transaction.commit(builder))
            .field(nonce.to_le_bytes())
            .finish()
    }

    /// Runs proof-of-work until the hash starts with `difficulty` zero digits
    pub fn mine(&mut self, difficulty: usize) {
        let proof = pow::solve(self, difficulty);
        self.nonce = proof.nonce;
        self.hash = proof.hash;

        debug!("Block mined: nonce {} hash {}", self.nonce, self.hash);
    }

    /// Checks that every transaction in the block is valid.
    ///
    /// A transfer without a signature counts as invalid.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions.iter().all(|transaction| match transaction.is_valid() {
            Ok(valid) => valid,
            Err(err) => {
                warn!("Invalid transaction in block {}: {}", self.hash, err);
                false
            }
        })
    }
}
