//! Configuration for a ledger instance

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fs;
use std::path::Path;

use crate::blockchain::hash::HASH_HEX_SIZE;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Difficulty {0} is longer than a block hash")]
    InvalidDifficulty(usize),

    #[error("Mining reward must be positive: {0}")]
    InvalidReward(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Number of leading zero hex digits a mined block hash needs
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    /// Amount minted for the miner of each block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,
}

fn default_difficulty() -> usize {
    2
}

fn default_mining_reward() -> f64 {
    100.0
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

impl ChainConfig {
    /// Loads and validates a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses and validates a JSON config document
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: ChainConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty > HASH_HEX_SIZE {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }
        if !(self.mining_reward.is_finite() && self.mining_reward > 0.0) {
            return Err(ConfigError::InvalidReward(self.mining_reward));
        }
        Ok(())
    }
}
