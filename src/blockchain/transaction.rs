use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::{verify_signature, Address, DigitalSignature, Wallet};
use super::hash::DigestBuilder;

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Unauthorized: wallet {signer} cannot sign transactions for another sender")]
    Unauthorized { signer: Address },

    #[error("Transaction not signed")]
    MissingSignature,
}

/// Represents a transaction in the blockchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transaction {
    /// Value moved from one account to another, authorized by the sender
    Transfer {
        sender: Address,
        recipient: Address,
        amount: f64,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<DigitalSignature>,
    },

    /// Value minted by the chain itself (mining reward). Needs no signature.
    Reward {
        recipient: Address,
        amount: f64,
        timestamp: DateTime<Utc>,
    },
}

impl Transaction {
    /// Creates a new unsigned transfer
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    pub fn new(sender: Address, recipient: Address, amount: f64) -> Self {
        Transaction::Transfer {
            sender,
            recipient,
            amount,
            timestamp: Utc::now(),
            signature: None,
        }
    }

    /// Creates a new reward transaction
    ///
    /// # Arguments
    ///
    /// * `recipient` - The address credited with the reward
    /// * `amount` - The reward amount
    pub fn new_reward(recipient: Address, amount: f64) -> Self {
        Transaction::Reward {
            recipient,
            amount,
            timestamp: Utc::now(),
        }
    }

    /// The sender, or `None` for minted value
    pub fn sender(&self) -> Option<&Address> {
        match self {
            Transaction::Transfer { sender, .. } => Some(sender),
            Transaction::Reward { .. } => None,
        }
    }

    pub fn recipient(&self) -> &Address {
        match self {
            Transaction::Transfer { recipient, .. } | Transaction::Reward { recipient, .. } => {
                recipient
            }
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Transaction::Transfer { amount, .. } | Transaction::Reward { amount, .. } => *amount,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Transaction::Transfer { timestamp, .. } | Transaction::Reward { timestamp, .. } => {
                *timestamp
            }
        }
    }

    pub fn signature(&self) -> Option<&DigitalSignature> {
        match self {
            Transaction::Transfer { signature, .. } => signature.as_ref(),
            Transaction::Reward { .. } => None,
        }
    }

    /// Checks if the transaction mints new value
    pub fn is_reward(&self) -> bool {
        matches!(self, Transaction::Reward { .. })
    }

    /// Checks if `address` is the sender or the recipient
    pub fn involves(&self, address: &Address) -> bool {
        self.sender() == Some(address) || self.recipient() == address
    }

    /// Calculates the digest that gets signed.
    ///
    /// Covers sender, recipient and amount only. The timestamp is left out, so
    /// the digest does not depend on the clock of the machine that built the
    /// transaction.
    pub fn calculate_hash(&self) -> String {
        let sender = self.sender().map(Address::as_str).unwrap_or_default();

        DigestBuilder::new()
            .field(self.kind())
            .field(sender)
            .field(self.recipient().as_str())
            .field(self.amount().to_le_bytes())
            .finish()
    }

    /// Signs the transaction with a wallet
    ///
    /// Fails with `Unauthorized` unless the wallet's address is the sender.
    /// Signing again replaces the previous signature.
    pub fn sign(&mut self, wallet: &Wallet) -> Result<(), TransactionError> {
        if self.sender() != Some(wallet.address()) {
            return Err(TransactionError::Unauthorized {
                signer: wallet.address().clone(),
            });
        }

        let signed = wallet.sign(self.calculate_hash().as_bytes());

        if let Transaction::Transfer { signature, .. } = self {
            *signature = Some(signed);
        }

        Ok(())
    }

    /// Verifies the transaction
    ///
    /// Rewards are always valid. A transfer without a signature is an error;
    /// otherwise the result of checking the signature against the sender.
    pub fn is_valid(&self) -> Result<bool, TransactionError> {
        match self {
            Transaction::Reward { .. } => Ok(true),
            Transaction::Transfer {
                sender, signature, ..
            } => {
                let signature = signature.as_ref().ok_or(TransactionError::MissingSignature)?;
                Ok(verify_signature(
                    self.calculate_hash().as_bytes(),
                    signature,
                    sender,
                ))
            }
        }
    }

    /// Appends the full record, including timestamp and signature, to a block digest
    pub(crate) fn commit(&self, builder: DigestBuilder) -> DigestBuilder {
        let sender = self.sender().map(Address::as_str).unwrap_or_default();
        let signature = self.signature().map(|s| s.0.as_str()).unwrap_or_default();

        builder
            .field(self.kind())
            .field(sender)
            .field(self.recipient().as_str())
            .field(self.amount().to_le_bytes())
            .field(
                self.timestamp()
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )
            .field(signature)
    }

    fn kind(&self) -> &'static str {
        match self {
            Transaction::Transfer { .. } => "transfer",
            Transaction::Reward { .. } => "reward",
        }
    }
}
