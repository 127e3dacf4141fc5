use log::{info, warn};
use thiserror::Error;

use crate::config::{ChainConfig, ConfigError};

use super::block::Block;
use super::crypto::Address;
use super::transaction::{Transaction, TransactionError};

/// Reasons a transaction is refused by `add_transaction`
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Transaction must include sender and recipient")]
    MissingAddress,

    #[error("Cannot add invalid transaction to chain: {0}")]
    InvalidTransaction(#[from] TransactionError),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Transaction amount must be positive: {0}")]
    NonPositiveAmount(f64),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },
}

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// Represents the blockchain.
///
/// Owns the block sequence and the queue of transactions waiting to be mined.
/// Both only change through `add_transaction` and `mine_pending_transactions`.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    chain: Vec<Block>,

    /// Pending transactions to be included in the next block
    pending_transactions: Vec<Transaction>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,

    /// Mining reward
    mining_reward: f64,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and the default config
    pub fn new() -> Self {
        Self::from_parts(&ChainConfig::default(), vec![Block::genesis()])
    }

    /// Creates a new blockchain with a genesis block and a custom config
    pub fn with_config(config: &ChainConfig) -> Result<Self, BlockchainError> {
        config.validate()?;
        Ok(Self::from_parts(config, vec![Block::genesis()]))
    }

    /// Rebuilds a blockchain from its serialized blocks.
    ///
    /// Fails if the blocks do not form a valid chain.
    pub fn restore(config: &ChainConfig, blocks: Vec<Block>) -> Result<Self, BlockchainError> {
        config.validate()?;

        if blocks.is_empty() {
            return Err(BlockchainError::InvalidChain("no blocks".to_string()));
        }

        let blockchain = Self::from_parts(config, blocks);
        blockchain.validate()?;

        info!("Restored blockchain with {} blocks", blockchain.chain.len());
        Ok(blockchain)
    }

    fn from_parts(config: &ChainConfig, chain: Vec<Block>) -> Self {
        Blockchain {
            chain,
            pending_transactions: Vec::new(),
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
        }
    }

    /// Gets the last block in the chain
    pub fn get_last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("blockchain always holds the genesis block")
    }

    /// Adds a new transaction to the pending transactions
    ///
    /// Only the confirmed balance is checked. Transactions already waiting in
    /// the queue are not subtracted, so several pending transfers from one
    /// sender can together spend more than it holds.
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<usize, BlockchainError> {
        if let Err(err) = self.check_transaction(&transaction) {
            warn!("Rejected transaction: {}", err);
            return Err(err.into());
        }

        self.pending_transactions.push(transaction);

        Ok(self.chain.len())
    }

    fn check_transaction(&self, transaction: &Transaction) -> Result<(), ValidationError> {
        let sender = match transaction.sender() {
            Some(sender) if !sender.is_empty() && !transaction.recipient().is_empty() => sender,
            _ => return Err(ValidationError::MissingAddress),
        };

        if !transaction.is_valid()? {
            return Err(ValidationError::InvalidSignature);
        }

        let amount = transaction.amount();
        if !(amount.is_finite() && amount > 0.0) {
            return Err(ValidationError::NonPositiveAmount(amount));
        }

        let available = self.get_balance(sender);
        if available < amount {
            return Err(ValidationError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        Ok(())
    }

    /// Mines a new block with the pending transactions
    ///
    /// A reward for `reward_address` is appended to the queue, the whole queue
    /// becomes the new block, and the queue is left empty.
    ///
    /// # Returns
    ///
    /// The newly mined block
    pub fn mine_pending_transactions(&mut self, reward_address: &Address) -> &Block {
        let mut transactions = std::mem::take(&mut self.pending_transactions);
        transactions.push(Transaction::new_reward(
            reward_address.clone(),
            self.mining_reward,
        ));

        let mut block = Block::new(transactions, self.get_last_block().hash.clone());
        block.mine(self.difficulty);

        info!(
            "Mined block {} with {} transactions, reward to {}",
            self.chain.len(),
            block.transactions.len(),
            reward_address
        );

        self.chain.push(block);
        self.get_last_block()
    }

    /// Computes the confirmed balance of an address
    pub fn get_balance(&self, address: &Address) -> f64 {
        self.chain
            .iter()
            .flat_map(|block| &block.transactions)
            .fold(0.0, |balance, transaction| {
                let mut balance = balance;
                if transaction.sender() == Some(address) {
                    balance -= transaction.amount();
                }
                if transaction.recipient() == address {
                    balance += transaction.amount();
                }
                balance
            })
    }

    /// Gets every confirmed transaction sent or received by an address, in chain order
    pub fn get_transaction_history(&self, address: &Address) -> Vec<&Transaction> {
        self.chain
            .iter()
            .flat_map(|block| &block.transactions)
            .filter(|transaction| transaction.involves(address))
            .collect()
    }

    /// Gets the entire blockchain
    pub fn get_chain(&self) -> &[Block] {
        &self.chain
    }

    /// Gets all pending transactions
    pub fn get_pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the blockchain, naming the first block that fails
    pub fn validate(&self) -> Result<(), BlockchainError> {
        let result = self.find_invalid_block();

        if let Err(reason) = &result {
            warn!("Blockchain validation failed: {}", reason);
        }

        result.map_err(BlockchainError::InvalidChain)
    }

    fn find_invalid_block(&self) -> Result<(), String> {
        if self.chain.first() != Some(&Block::genesis()) {
            return Err("genesis block does not match".to_string());
        }

        for (index, pair) in self.chain.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);
            let height = index + 1;

            if !current_block.has_valid_transactions() {
                return Err(format!("block {} has invalid transactions", height));
            }

            // Check if the hash is correct
            if current_block.hash != current_block.calculate_hash() {
                return Err(format!("block {} hash does not match its content", height));
            }

            // Check if the previous hash is correct
            if current_block.previous_hash != previous_block.hash {
                return Err(format!("block {} is not linked to block {}", height, index));
            }
        }

        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Wallet;

    fn signed(wallet: &Wallet, recipient: &str, amount: f64) -> Transaction {
        let mut transaction = Transaction::new(wallet.address().clone(), Address::from(recipient), amount);
        transaction.sign(wallet).unwrap();
        transaction
    }

    /// A chain where `wallet` owns one mined reward and has sent 30 to "bob"
    fn funded_chain(wallet: &Wallet) -> Blockchain {
        let mut blockchain = Blockchain::new();
        blockchain.mine_pending_transactions(wallet.address());
        blockchain.add_transaction(signed(wallet, "bob", 30.0)).unwrap();
        blockchain.mine_pending_transactions(&Address::from("miner"));
        blockchain
    }

    #[test]
    fn test_new_blockchain() {
        let blockchain = Blockchain::new();
        let chain = blockchain.get_chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0], Block::genesis());
        assert_eq!(blockchain.difficulty(), 2);
        assert_eq!(blockchain.mining_reward(), 100.0);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let config = ChainConfig {
            difficulty: 100,
            mining_reward: 10.0,
        };
        assert!(matches!(
            Blockchain::with_config(&config),
            Err(BlockchainError::Config(ConfigError::InvalidDifficulty(100)))
        ));
    }

    #[test]
    fn test_add_transaction() {
        let wallet = Wallet::new();
        let mut blockchain = Blockchain::new();
        blockchain.mine_pending_transactions(wallet.address());

        let block_index = blockchain.add_transaction(signed(&wallet, "bob", 10.0)).unwrap();
        assert_eq!(block_index, 2);

        let pending = blockchain.get_pending_transactions();
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_add_transaction_rejections_leave_queue_unchanged() {
        let wallet = Wallet::new();
        let mut blockchain = Blockchain::new();
        blockchain.mine_pending_transactions(wallet.address());

        let reward = Transaction::new_reward(Address::from("bob"), 10.0);
        assert!(matches!(
            blockchain.add_transaction(reward),
            Err(BlockchainError::Validation(ValidationError::MissingAddress))
        ));

        let mut no_recipient = Transaction::new(wallet.address().clone(), Address::from(""), 10.0);
        no_recipient.sign(&wallet).unwrap();
        assert!(matches!(
            blockchain.add_transaction(no_recipient),
            Err(BlockchainError::Validation(ValidationError::MissingAddress))
        ));

        let unsigned = Transaction::new(wallet.address().clone(), Address::from("bob"), 10.0);
        assert!(matches!(
            blockchain.add_transaction(unsigned),
            Err(BlockchainError::Validation(ValidationError::InvalidTransaction(
                TransactionError::MissingSignature
            )))
        ));

        let mut forged = signed(&wallet, "bob", 10.0);
        if let Transaction::Transfer { amount, .. } = &mut forged {
            *amount = 20.0;
        }
        assert!(matches!(
            blockchain.add_transaction(forged),
            Err(BlockchainError::Validation(ValidationError::InvalidSignature))
        ));

        for amount in [0.0, -5.0] {
            assert!(matches!(
                blockchain.add_transaction(signed(&wallet, "bob", amount)),
                Err(BlockchainError::Validation(ValidationError::NonPositiveAmount(_)))
            ));
        }

        assert!(matches!(
            blockchain.add_transaction(signed(&wallet, "bob", 100.5)),
            Err(BlockchainError::Validation(ValidationError::InsufficientFunds {
                required,
                available,
            })) if required == 100.5 && available == 100.0
        ));

        assert!(blockchain.get_pending_transactions().is_empty());
        assert_eq!(blockchain.get_chain().len(), 2);
    }

    #[test]
    fn test_pending_transactions_can_overspend() {
        let wallet = Wallet::new();
        let mut blockchain = Blockchain::new();
        blockchain.mine_pending_transactions(wallet.address());

        blockchain.add_transaction(signed(&wallet, "bob", 80.0)).unwrap();
        blockchain.add_transaction(signed(&wallet, "carol", 80.0)).unwrap();
        assert_eq!(blockchain.get_pending_transactions().len(), 2);

        blockchain.mine_pending_transactions(&Address::from("miner"));
        assert_eq!(blockchain.get_balance(wallet.address()), -60.0);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_mine_block() {
        let wallet = Wallet::new();
        let mut blockchain = Blockchain::new();
        blockchain.mine_pending_transactions(wallet.address());
        blockchain.add_transaction(signed(&wallet, "bob", 10.0)).unwrap();

        let previous_hash = blockchain.get_last_block().hash.clone();
        let block = blockchain.mine_pending_transactions(&Address::from("miner"));

        assert_eq!(block.transactions.len(), 2); // Original transaction + mining reward
        assert!(block.transactions[1].is_reward());
        assert_eq!(block.previous_hash, previous_hash);
        assert!(block.hash.starts_with("00"));

        // Check that the pending transactions are cleared
        assert!(blockchain.get_pending_transactions().is_empty());
        assert_eq!(blockchain.get_chain().len(), 3);

        assert_eq!(blockchain.get_balance(&Address::from("bob")), 10.0);
        assert_eq!(blockchain.get_balance(wallet.address()), 90.0);
        assert_eq!(blockchain.get_balance(&Address::from("miner")), 100.0);
    }

    #[test]
    fn test_balance_is_pure() {
        let wallet = Wallet::new();
        let blockchain = funded_chain(&wallet);

        let first = blockchain.get_balance(wallet.address());
        let second = blockchain.get_balance(wallet.address());
        assert_eq!(first, second);
        assert_eq!(first, 70.0);
        assert_eq!(blockchain.get_balance(&Address::from("nobody")), 0.0);
    }

    #[test]
    fn test_transaction_history() {
        let wallet = Wallet::new();
        let blockchain = funded_chain(&wallet);

        let history = blockchain.get_transaction_history(wallet.address());
        assert_eq!(history.len(), 2);
        assert!(history[0].is_reward());
        assert_eq!(history[1].recipient(), &Address::from("bob"));

        let bob = blockchain.get_transaction_history(&Address::from("bob"));
        assert_eq!(bob.len(), 1);
        assert!(blockchain
            .get_transaction_history(&Address::from("nobody"))
            .is_empty());
    }

    #[test]
    fn test_blockchain_validity() {
        let wallet = Wallet::new();
        let blockchain = funded_chain(&wallet);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_tampered_amount_breaks_hash() {
        let wallet = Wallet::new();
        let mut blockchain = funded_chain(&wallet);

        if let Transaction::Reward { amount, .. } = &mut blockchain.chain[1].transactions[0] {
            *amount = 1_000.0;
        }

        assert!(!blockchain.is_valid());
        assert!(matches!(
            blockchain.validate(),
            Err(BlockchainError::InvalidChain(reason)) if reason.contains("hash")
        ));
    }

    #[test]
    fn test_remined_block_breaks_linkage() {
        let wallet = Wallet::new();
        let mut blockchain = funded_chain(&wallet);

        if let Transaction::Reward { amount, .. } = &mut blockchain.chain[1].transactions[0] {
            *amount = 1_000.0;
        }
        blockchain.chain[1].nonce = 0;
        blockchain.chain[1].mine(2);

        assert!(!blockchain.is_valid());
        assert!(matches!(
            blockchain.validate(),
            Err(BlockchainError::InvalidChain(reason)) if reason.contains("linked")
        ));
    }

    #[test]
    fn test_tampered_signature_is_detected() {
        let wallet = Wallet::new();
        let mut blockchain = funded_chain(&wallet);

        if let Transaction::Transfer { amount, .. } = &mut blockchain.chain[2].transactions[0] {
            *amount = 1.0;
        }

        assert!(matches!(
            blockchain.validate(),
            Err(BlockchainError::InvalidChain(reason)) if reason.contains("invalid transactions")
        ));
    }

    #[test]
    fn test_replaced_genesis_is_detected() {
        let mut blockchain = Blockchain::new();
        blockchain.chain[0] = Block::new(Vec::new(), "0".to_string());
        assert!(!blockchain.is_valid());
    }

    #[test]
    fn test_restore() {
        let wallet = Wallet::new();
        let blockchain = funded_chain(&wallet);
        let config = ChainConfig::default();

        let json = serde_json::to_string(blockchain.get_chain()).unwrap();
        let blocks: Vec<Block> = serde_json::from_str(&json).unwrap();
        let restored = Blockchain::restore(&config, blocks).unwrap();
        assert_eq!(restored.get_chain(), blockchain.get_chain());
        assert_eq!(restored.get_balance(wallet.address()), 70.0);

        let mut blocks = blockchain.get_chain().to_vec();
        blocks.remove(1);
        assert!(matches!(
            Blockchain::restore(&config, blocks),
            Err(BlockchainError::InvalidChain(_))
        ));

        assert!(matches!(
            Blockchain::restore(&config, Vec::new()),
            Err(BlockchainError::InvalidChain(_))
        ));
    }
}
