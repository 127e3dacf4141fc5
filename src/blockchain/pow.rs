use log::trace;

use super::block::Block;
use super::hash::leading_zero_digits;

/// Result of a proof-of-work search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub nonce: u64,
    pub hash: String,
}

/// Checks if a hash starts with at least `difficulty` zero hex digits
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    leading_zero_digits(hash) >= difficulty
}

/// Searches for a nonce that makes the block hash meet `difficulty`.
///
/// The search starts at the block's current nonce, so a block that already
/// qualifies (always the case for difficulty 0) keeps its nonce. The block
/// itself is left untouched.
pub fn solve(block: &Block, difficulty: usize) -> Proof {
    let mut nonce = block.nonce;

    loop {
        let hash = block.hash_with_nonce(nonce);

        if meets_difficulty(&hash, difficulty) {
            trace!("proof found at nonce {} for difficulty {}", nonce, difficulty);
            return Proof { nonce, hash };
        }

        nonce = nonce.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("00ff", 2));
        assert!(meets_difficulty("000f", 2));
        assert!(!meets_difficulty("0fff", 2));
        assert!(meets_difficulty("ffff", 0));
    }

    #[test]
    fn test_solve_is_pure() {
        let block = Block::new(Vec::new(), "0".to_string());
        let before = block.clone();

        let proof = solve(&block, 2);

        assert_eq!(block, before);
        assert!(proof.hash.starts_with("00"));
        assert_eq!(proof.hash, block.hash_with_nonce(proof.nonce));
    }

    #[test]
    fn test_solve_zero_difficulty_keeps_nonce() {
        let block = Block::new(Vec::new(), "0".to_string());
        let proof = solve(&block, 0);
        assert_eq!(proof.nonce, block.nonce);
        assert_eq!(proof.hash, block.hash);
    }
}
